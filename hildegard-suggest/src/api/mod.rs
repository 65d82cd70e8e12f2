//! HTTP API handlers for hildegard-suggest

pub mod buildinfo;
pub mod health;
pub mod sessions;
pub mod ui;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use sessions::{apply_action, create_session, delete_session, get_session};
pub use ui::{serve_app_js, serve_index};
