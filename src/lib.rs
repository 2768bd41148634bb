pub mod app;
pub mod config;
pub mod error;
pub mod db {
    pub mod models;
    pub mod repository;
    pub mod store;
}
pub mod search {
    pub mod client;
    pub mod record;
}
pub mod sync {
    pub mod synchronizer;
}
pub mod topics {
    pub mod catalog;
}
pub mod api {
    pub mod errors;
    pub mod posts;
    pub mod topics;
}
