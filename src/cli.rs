use clap::{Parser, Subcommand, ValueEnum};

use crate::authorization::ViewPermission;

#[derive(Parser, Debug)]
#[command(name = "crm-persons-api")]
#[command(about = "CRM contacts API - person records, search and lifecycle notifications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve(ServeArgs),

    #[command(about = "Issue a bearer token signed with the configured secret")]
    Token {
        #[arg(long, help = "User id to embed as the token subject")]
        user_id: i64,

        #[arg(long, value_enum, default_value_t = PermissionArg::Individual)]
        view_permission: PermissionArg,
    },

    #[command(about = "Create missing tables and indexes, then exit")]
    Migrate,
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct ServeArgs {
    #[arg(long, help = "Bind address, overrides CRM_API_HOST")]
    pub host: Option<String>,

    #[arg(long, help = "Bind port, overrides CRM_API_PORT")]
    pub port: Option<u16>,

    #[arg(long, value_enum, default_value_t = StoreKind::Postgres)]
    pub store: StoreKind,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionArg {
    Global,
    Group,
    Individual,
}

impl From<PermissionArg> for ViewPermission {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::Global => ViewPermission::Global,
            PermissionArg::Group => ViewPermission::Group,
            PermissionArg::Individual => ViewPermission::Individual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_optional() {
        let cli = Cli::try_parse_from(["crm-persons-api"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from(["crm-persons-api", "serve", "--port", "9000", "--store", "memory"]).unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert_eq!(args.port, Some(9000));
                assert_eq!(args.store, StoreKind::Memory);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_token_command() {
        let cli = Cli::try_parse_from(["crm-persons-api", "token", "--user-id", "4", "--view-permission", "group"])
            .unwrap();
        match cli.command {
            Some(Commands::Token { user_id, view_permission }) => {
                assert_eq!(user_id, 4);
                assert_eq!(ViewPermission::from(view_permission), ViewPermission::Group);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
