//! Templates: inheritance, macros, context processors, custom globals,
//! filters and tests, static files, flash messages and error pages.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use lantern::error_handler::status_text;
use lantern::extractors::State;
use lantern::{
    App, DefaultErrorHandler, Error, ErrorHandler, Req, Res, Result, SessionLayer, Templates,
    escape,
};
use minijinja::{Value, context};
use serde::Serialize;

const TEMPLATES: [(&str, &str); 7] = [
    ("base.html", include_str!("../templates/base.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("watchlist.html", include_str!("../templates/watchlist.html")),
    (
        "watchlist_with_static.html",
        include_str!("../templates/watchlist_with_static.html"),
    ),
    ("errors/404.html", include_str!("../templates/errors/404.html")),
    ("errors/500.html", include_str!("../templates/errors/500.html")),
];

#[derive(Serialize)]
struct User {
    username: &'static str,
    bio: &'static str,
}

#[derive(Serialize)]
struct Movie {
    name: &'static str,
    year: &'static str,
}

const USER: User = User {
    username: "Grey Li",
    bio: "A boy who loves movies and music.",
};

const MOVIES: [Movie; 10] = [
    Movie { name: "My Neighbor Totoro", year: "1988" },
    Movie { name: "Three Colours trilogy", year: "1993" },
    Movie { name: "Forrest Gump", year: "1994" },
    Movie { name: "Perfect Blue", year: "1997" },
    Movie { name: "The Matrix", year: "1999" },
    Movie { name: "Memento", year: "2000" },
    Movie { name: "The Bucket list", year: "2007" },
    Movie { name: "Black Swan", year: "2010" },
    Movie { name: "Gone Girl", year: "2014" },
    Movie { name: "CoCo", year: "2017" },
];

/// Shared state.
pub struct TemplateDemo {
    templates: Arc<Templates>,
    static_dir: PathBuf,
}

/// Appends a music note. The input is escaped, the note is not.
fn musical(value: String) -> Value {
    Value::from_safe_string(format!("{} &#9835;", escape(&value)))
}

fn baz(value: Value) -> bool {
    value.as_str() == Some("baz")
}

fn templates() -> Result<Templates> {
    let mut templates = Templates::new();
    for (name, source) in TEMPLATES {
        templates.add_template(name, source)?;
    }
    templates.context_processor(|_req| {
        BTreeMap::from([("foo".to_string(), Value::from("I am foo."))])
    });
    templates.add_function("bar", || "I am bar.");
    templates.add_filter("musical", musical);
    templates.add_test("baz", baz);
    Ok(templates)
}

/// Renders 404 and 500 from templates, anything else as plain text.
pub struct ErrorPages {
    templates: Arc<Templates>,
}

impl ErrorHandler for ErrorPages {
    fn handle(&self, error: Error) -> Res {
        let code = error.status_code();
        let name = match code {
            404 => "errors/404.html",
            500 => "errors/500.html",
            _ => return DefaultErrorHandler.handle(error),
        };
        let empty: Vec<String> = Vec::new();
        match self.templates.render_to_string(name, context! { flashes => empty }) {
            Ok(page) => Res::builder().status(code).html(page),
            Err(e) => {
                tracing::error!(error = %e, template = name, "error page failed to render");
                Res::builder().status(code).text(status_text(code))
            }
        }
    }
}

/// Build the app, signing sessions with `secret`.
pub fn app(secret: &str) -> Result<App<TemplateDemo>> {
    let templates = Arc::new(templates()?);
    let mut app = App::with_state(TemplateDemo {
        templates: Arc::clone(&templates),
        static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
    });
    app.layer(SessionLayer::new(secret));
    app.set_error_handler(ErrorPages { templates });

    app.get("/", index);
    app.get("/base", base);
    app.get("/watchlist", watchlist);
    app.get("/watchlist2", watchlist_with_static);
    app.get("/flash", just_flash);
    app.get("/static/{*path}", static_file);
    Ok(app)
}

async fn index(State(demo): State<TemplateDemo>, req: Req) -> Result<Res> {
    demo.templates.render(&req, "index.html", context! {})
}

async fn base(State(demo): State<TemplateDemo>, req: Req) -> Result<Res> {
    demo.templates.render(&req, "base.html", context! {})
}

async fn watchlist(State(demo): State<TemplateDemo>, req: Req) -> Result<Res> {
    demo.templates.render(
        &req,
        "watchlist.html",
        context! { user => USER, movies => MOVIES },
    )
}

async fn watchlist_with_static(State(demo): State<TemplateDemo>, req: Req) -> Result<Res> {
    demo.templates.render(
        &req,
        "watchlist_with_static.html",
        context! { user => USER, movies => MOVIES },
    )
}

async fn just_flash(req: Req) -> Result<Res> {
    req.session()?.flash("Hello, this is a flash message.");
    Ok(Res::redirect("/"))
}

async fn static_file(State(demo): State<TemplateDemo>, req: Req) -> Res {
    let path = req.param("path").unwrap_or_default();
    Res::from_directory(&demo.static_dir, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hyper::Request;

    const SECRET: &str = "secret string";

    fn get(path: &str) -> Request<Bytes> {
        Request::get(path).body(Bytes::new()).unwrap()
    }

    async fn text(app: &mut App<TemplateDemo>, path: &str) -> (u16, String) {
        let res = app.call(get(path)).await;
        let status = res.status_code().as_u16();
        (status, res.into_text().await.unwrap())
    }

    #[tokio::test]
    async fn test_index_uses_custom_template_functions() {
        let mut app = app(SECRET).unwrap();
        let (status, body) = text(&mut app, "/").await;
        assert_eq!(status, 200);
        assert!(body.contains("Filter: I am foo. &#9835;"), "{body}");
        assert!(body.contains("Global: I am bar."));
        assert!(body.contains("Test: I am baz."));
        assert!(body.contains("We are quxs."));
        assert!(!body.contains("I am qux."));
    }

    #[test]
    fn test_musical_escapes_input() {
        assert_eq!(musical("<b>".into()).to_string(), "&lt;b&gt; &#9835;");
        assert!(baz(Value::from("baz")));
        assert!(!baz(Value::from(42)));
    }

    #[tokio::test]
    async fn test_watchlists() {
        let mut app = app(SECRET).unwrap();
        let (status, body) = text(&mut app, "/watchlist").await;
        assert_eq!(status, 200);
        assert!(body.contains("<title>Grey Li's Watchlist</title>"), "{body}");
        assert!(body.contains("Watchlist (10):"));
        assert!(body.contains("<li>My Neighbor Totoro - 1988</li>"));
        assert!(!body.contains("Below is the movie list"));

        let (status, body) = text(&mut app, "/watchlist2").await;
        assert_eq!(status, 200);
        assert!(body.contains(r#"href="/static/style.css""#));
        assert!(body.contains("<li>CoCo &#9835; - 2017</li>"));
    }

    #[tokio::test]
    async fn test_base_page() {
        let (status, body) = text(&mut app(SECRET).unwrap(), "/base").await;
        assert_eq!(status, 200);
        assert!(body.contains("<title>Template - Lantern Demos</title>"));
    }

    #[tokio::test]
    async fn test_flash_shows_on_next_page() {
        let mut app = app(SECRET).unwrap();
        let res = app.call(get("/flash")).await;
        assert_eq!(res.status_code(), 302);
        assert_eq!(res.headers()["location"], "/");
        let cookie = res
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("session="))
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string();

        let res = app
            .call(Request::get("/").header("cookie", &cookie).body(Bytes::new()).unwrap())
            .await;
        assert!(
            res.into_text()
                .await
                .unwrap()
                .contains(r#"<div class="alert">Hello, this is a flash message.</div>"#)
        );
    }

    #[tokio::test]
    async fn test_static_files() {
        let mut app = app(SECRET).unwrap();
        let res = app.call(get("/static/style.css")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.headers()["content-type"], "text/css");

        let (status, body) = text(&mut app, "/static/../Cargo.toml").await;
        assert_eq!(status, 404);
        assert!(body.contains("<h1>Page Not Found</h1>"));
    }

    #[tokio::test]
    async fn test_error_pages() {
        let mut app = app(SECRET).unwrap();
        let (status, body) = text(&mut app, "/missing").await;
        assert_eq!(status, 404);
        assert!(body.contains("<p>You are lost...</p>"));

        app.get("/boom", |_: Req| async { Err::<Res, _>(Error::internal("boom")) });
        let (status, body) = text(&mut app, "/boom").await;
        assert_eq!(status, 500);
        assert!(body.contains("<h1>Internal Server Error</h1>"));

        app.get("/teapot", |_: Req| async { Err::<Res, _>(Error::status(418)) });
        let (status, body) = text(&mut app, "/teapot").await;
        assert_eq!(status, 418);
        assert!(!body.contains("<html"));
    }
}
