// handlers/persons - /api/contacts/persons routes
//
// GET    /api/contacts/persons               list
// GET    /api/contacts/persons/search        search
// GET    /api/contacts/persons/:id           show
// POST   /api/contacts/persons               store
// PUT    /api/contacts/persons/:id           update (PATCH too)
// DELETE /api/contacts/persons/:id           destroy
// POST   /api/contacts/persons/mass-destroy  mass_destroy

pub mod destroy;
pub mod list;
pub mod mass_destroy;
pub mod search;
pub mod show;
pub mod store;
pub mod update;

pub use destroy::destroy;
pub use list::list;
pub use mass_destroy::mass_destroy;
pub use search::search;
pub use show::show;
pub use store::store;
pub use update::update;
