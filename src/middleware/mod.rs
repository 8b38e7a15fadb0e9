mod platform_auth;

pub use platform_auth::platform_auth;
