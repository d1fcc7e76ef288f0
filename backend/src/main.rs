#![deny(clippy::all)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![warn(clippy::todo)]
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]

#[tokio::main]
async fn main() {
    app::run().await;
}


pub mod cfg {
    mod app_settings;
    mod auth_settings;
    mod cache_settings;
    mod database_settings;
    mod jwt_settings;
    mod server_settings;

    pub use app_settings::*;
    pub use auth_settings::*;
    pub use cache_settings::*;
    pub use database_settings::*;
    pub use jwt_settings::*;
    pub use server_settings::*;
}

pub mod core {
    mod api_error;
    mod cache;
    mod context;
    mod dberror;

    pub use api_error::*;
    pub use cache::*;
    pub use context::*;
    pub use dberror::*;
}

pub mod auth {
    mod gate;
    mod jwt;
    mod password;
    mod roles;

    pub use gate::*;
    pub use jwt::*;
    pub use password::*;
    pub use roles::*;
}

pub mod db {
    mod assignments;
    mod banners;
    mod documents;
    mod expenses;
    mod notification_settings;
    mod payments;
    mod properties;
    mod refresh_tokens;
    mod service_cards;
    mod user_roles;
    mod users;

    pub use assignments::*;
    pub use banners::*;
    pub use documents::*;
    pub use expenses::*;
    pub use notification_settings::*;
    pub use payments::*;
    pub use properties::*;
    pub use refresh_tokens::*;
    pub use service_cards::*;
    pub use user_roles::*;
    pub use users::*;
}

pub mod routes {
    pub mod access;
    pub mod admin;
    pub mod auth;
    pub mod banners;
    pub mod dashboard;
    pub mod documents;
    pub mod expenses;
    pub mod finance;
    pub mod health;
    pub mod notifications;
    pub mod payments;
    pub mod profile;
    pub mod properties;
    pub mod service_cards;
    pub mod tenancy;
}

pub mod services {
    pub mod audit;
    pub mod documents;
    pub mod finance;
    pub mod payments;
    pub mod schedule;
    pub mod sms;
    pub mod tenancy;
}

pub mod middleware {
    pub mod rate_limit;
    pub mod role_guard;
}

pub mod app {
    mod cli;
    mod migrations;
    mod router;
    mod server;

    pub use cli::*;
    pub use migrations::*;
    pub use router::*;
    pub use server::*;
}
