pub mod cookies;
pub mod redirect;
pub mod resolve;
pub mod session;

pub use cookies::CookieJar;
pub use resolve::resolve_url;
pub use session::{FetchScope, HttpSession, PageState};
