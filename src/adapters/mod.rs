// Adapters layer: concrete implementations for external systems (http, spreadsheet files, storage).

pub mod http;
pub mod spreadsheet;
pub mod storage;
