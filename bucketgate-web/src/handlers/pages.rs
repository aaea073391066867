//! Page handlers

use crate::auth::CurrentUser;
use crate::templates::{HtmlTemplate, IndexTemplate};

/// Main application page. The access gate has already sent anonymous
/// callers to the login page.
pub async fn index_page(user: CurrentUser) -> HtmlTemplate<IndexTemplate> {
    HtmlTemplate(IndexTemplate::new(user.username))
}
