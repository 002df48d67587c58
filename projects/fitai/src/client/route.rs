//! Client-side page routes.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRoute {
    Landing,
    Login,
    Register,
    Profile,
    Dashboard,
    Plan,
    Community,
    Friends,
    Chat,
    Admin,
    Market,
    Cart,
    Checkout,
    Orders,
    Music,
    Author,
    Product(String),
    Order(String),
}

impl ClientRoute {
    /// Parse a page name or URL fragment (`"plan"`, `"#plan"`, `"/#product/12"`).
    /// Unknown pages resolve to `Landing`.
    pub fn parse(page: &str) -> Self {
        let page = page.trim_start_matches('/').trim_start_matches('#');
        match page {
            "" | "landing" => ClientRoute::Landing,
            "login" => ClientRoute::Login,
            "register" => ClientRoute::Register,
            "profile" => ClientRoute::Profile,
            "dashboard" => ClientRoute::Dashboard,
            "plan" => ClientRoute::Plan,
            "community" => ClientRoute::Community,
            "friends" => ClientRoute::Friends,
            "chat" => ClientRoute::Chat,
            "admin" => ClientRoute::Admin,
            "market" => ClientRoute::Market,
            "cart" => ClientRoute::Cart,
            "checkout" => ClientRoute::Checkout,
            "orders" => ClientRoute::Orders,
            "music" => ClientRoute::Music,
            "author" => ClientRoute::Author,
            other => match other.split_once('/') {
                Some(("product", id)) if !id.is_empty() => ClientRoute::Product(id.to_string()),
                Some(("order", id)) if !id.is_empty() => ClientRoute::Order(id.to_string()),
                _ => ClientRoute::Landing,
            },
        }
    }

    /// The page name used in the URL fragment.
    pub fn as_page(&self) -> String {
        let name = match self {
            ClientRoute::Landing => "landing",
            ClientRoute::Login => "login",
            ClientRoute::Register => "register",
            ClientRoute::Profile => "profile",
            ClientRoute::Dashboard => "dashboard",
            ClientRoute::Plan => "plan",
            ClientRoute::Community => "community",
            ClientRoute::Friends => "friends",
            ClientRoute::Chat => "chat",
            ClientRoute::Admin => "admin",
            ClientRoute::Market => "market",
            ClientRoute::Cart => "cart",
            ClientRoute::Checkout => "checkout",
            ClientRoute::Orders => "orders",
            ClientRoute::Music => "music",
            ClientRoute::Author => "author",
            ClientRoute::Product(id) => return format!("product/{}", id),
            ClientRoute::Order(id) => return format!("order/{}", id),
        };
        name.to_string()
    }

    /// History URL pushed after navigation.
    pub fn url(&self) -> String {
        match self {
            ClientRoute::Landing | ClientRoute::Dashboard => "/".to_string(),
            other => format!("/#{}", other.as_page()),
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            ClientRoute::Landing
                | ClientRoute::Login
                | ClientRoute::Register
                | ClientRoute::Author
                | ClientRoute::Product(_)
                | ClientRoute::Order(_)
        )
    }

    /// The route actually rendered for a visitor: protected pages send
    /// anonymous users to the login page.
    pub fn guard(self, authenticated: bool) -> Self {
        if self.requires_auth() && !authenticated {
            ClientRoute::Login
        } else {
            self
        }
    }
}

impl fmt::Display for ClientRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_pages() {
        assert_eq!(ClientRoute::parse("plan"), ClientRoute::Plan);
        assert_eq!(ClientRoute::parse("#music"), ClientRoute::Music);
        assert_eq!(ClientRoute::parse("/#checkout"), ClientRoute::Checkout);
        assert_eq!(ClientRoute::parse(""), ClientRoute::Landing);
    }

    #[test]
    fn test_parse_dynamic_pages() {
        assert_eq!(ClientRoute::parse("product/42"), ClientRoute::Product("42".into()));
        assert_eq!(ClientRoute::parse("#order/9"), ClientRoute::Order("9".into()));
        assert_eq!(ClientRoute::parse("product/"), ClientRoute::Landing);
    }

    #[test]
    fn test_unknown_page_is_landing() {
        assert_eq!(ClientRoute::parse("settings"), ClientRoute::Landing);
        assert_eq!(ClientRoute::parse("user/3"), ClientRoute::Landing);
    }

    #[test]
    fn test_url_for_home_pages() {
        assert_eq!(ClientRoute::Landing.url(), "/");
        assert_eq!(ClientRoute::Dashboard.url(), "/");
        assert_eq!(ClientRoute::Friends.url(), "/#friends");
        assert_eq!(ClientRoute::Product("5".into()).url(), "/#product/5");
    }

    #[test]
    fn test_page_roundtrip_for_every_static_route() {
        let routes = [
            ClientRoute::Login, ClientRoute::Register, ClientRoute::Profile,
            ClientRoute::Dashboard, ClientRoute::Plan, ClientRoute::Community,
            ClientRoute::Friends, ClientRoute::Chat, ClientRoute::Admin,
            ClientRoute::Market, ClientRoute::Cart, ClientRoute::Checkout,
            ClientRoute::Orders, ClientRoute::Music, ClientRoute::Author,
        ];
        for route in routes {
            assert_eq!(ClientRoute::parse(&route.as_page()), route);
        }
    }

    #[test]
    fn test_guard_redirects_anonymous_users() {
        assert_eq!(ClientRoute::Market.guard(false), ClientRoute::Login);
        assert_eq!(ClientRoute::Market.guard(true), ClientRoute::Market);
        assert_eq!(ClientRoute::Author.guard(false), ClientRoute::Author);
        assert_eq!(ClientRoute::Register.guard(false), ClientRoute::Register);
    }
}
