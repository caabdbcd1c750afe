use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::{Request, Response};

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Authorization, Content-Type, Accept";

/// Adds CORS headers for the configured origins. Credentials are allowed, so
/// a wildcard configuration echoes the caller's `Origin` instead of `*`.
pub struct Cors {
    allowed_origins: Vec<String>,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }

    pub fn allowed_origin<'a>(&self, origin: &'a str) -> Option<&'a str> {
        if self.allows_any() || self.allowed_origins.iter().any(|allowed| allowed == origin) {
            Some(origin)
        } else {
            None
        }
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let Some(origin) = request
            .headers()
            .get_one("Origin")
            .and_then(|origin| self.allowed_origin(origin))
        else {
            return;
        };

        response.set_header(Header::new("Access-Control-Allow-Origin", origin.to_string()));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        response.set_header(Header::new("Access-Control-Allow-Methods", ALLOWED_METHODS));
        response.set_header(Header::new("Access-Control-Allow-Headers", ALLOWED_HEADERS));
        response.set_header(Header::new("Vary", "Origin"));
    }
}

/// Answers every preflight request; the fairing supplies the headers.
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::NoContent
}
