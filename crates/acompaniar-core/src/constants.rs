/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_VERSION_COMPONENT: &str = "v1";
pub const API_ROUTE_PREFIX: &str =
    const_str::concat!("/", API_ROUTE_COMPONENT, "/", API_VERSION_COMPONENT);

pub const AUTH_ROUTE_COMPONENT: &str = "auth";
pub const USERS_ROUTE_COMPONENT: &str = "users";
pub const CONTACTS_ROUTE_COMPONENT: &str = "contacts";
pub const EMERGENCY_ROUTE_COMPONENT: &str = "emergency";
pub const CENTERS_ROUTE_COMPONENT: &str = "centros";

pub const CONTACTS_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", CONTACTS_ROUTE_COMPONENT);
pub const EMERGENCY_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", EMERGENCY_ROUTE_COMPONENT);

/// Longest custom text accepted on an alert.
pub const ALERT_MESSAGE_MAX_CHARS: usize = 160;

/// Two concatenated SMS segments.
pub const SMS_BODY_MAX_CHARS: usize = 320;

pub const CONTACT_NAME_MAX_CHARS: usize = 50;
pub const ADDRESS_MAX_CHARS: usize = 255;
pub const PASSWORD_MIN_CHARS: usize = 6;
