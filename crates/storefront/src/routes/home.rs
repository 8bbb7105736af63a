//! Static page handlers: home, menu and location.

use askama::Template;
use askama_web::WebTemplate;

use crate::filters;
use crate::middleware::PageContext;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
}

/// Menu page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/menu.html")]
pub struct MenuTemplate {
    pub ctx: PageContext,
}

/// Shop location page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/location.html")]
pub struct LocationTemplate {
    pub ctx: PageContext,
}

/// `GET /`
pub async fn home(ctx: PageContext) -> HomeTemplate {
    HomeTemplate { ctx }
}

/// `GET /menu`
pub async fn menu(ctx: PageContext) -> MenuTemplate {
    MenuTemplate { ctx }
}

/// `GET /location`
pub async fn location(ctx: PageContext) -> LocationTemplate {
    LocationTemplate { ctx }
}
