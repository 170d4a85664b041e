// handlers - HTTP boundary
//
// One module per resource, one file per route operation. Handlers extract
// the request, call the service and shape the response; nothing else.

pub mod persons;
