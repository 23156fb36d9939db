//! Requests and responses: URL variables, status codes, content types,
//! cookies, the session, AJAX and redirecting back safely.

use std::sync::Arc;

use lantern::extractors::Path;
use lantern::{
    App, Cookie, Error, IntoRes, Next, Req, Res, Result, Route, Router, SessionLayer, escape,
    from_fn, redirect_back,
};
use serde::Deserialize;

/// Build the app, signing sessions with `secret`.
pub fn app(secret: &str) -> App {
    let mut app = App::new();
    app.layer(SessionLayer::new(secret));

    app.get("/", hello);
    app.get("/hello", hello);
    app.get("/hi", hi);
    app.get("/goback/{year}", go_back);
    app.get("/colors/{color}", three_colors);
    app.get("/brew/{drink}", teapot);
    app.get("/404", not_found);

    let mut note_routes = Router::new();
    note_routes.get("", note);
    note_routes.get("/{content_type}", note);
    app.nest("/note", note_routes);

    app.get("/set/{name}", set_cookie);
    app.get("/login", login);
    app.get("/logout", logout);

    let mut admin_route = Route::get("/admin", admin);
    admin_route.layer(from_fn(require_login));
    app.route(admin_route);

    app.get("/post", show_post);
    app.get("/more", load_post);
    app.get("/foo", foo);
    app.get("/bar", bar);
    app.get("/do-something", do_something);
    app
}

/// Greets by `name` from the query string, then the `name` cookie.
async fn hello(req: Req) -> Result<String> {
    let name = req
        .query_value("name")
        .or_else(|| req.cookie("name"))
        .unwrap_or_else(|| "Human".to_string());
    let mut response = format!("<h1>Hello, {}!</h1>", escape(&name));
    if req.session()?.contains("logged_in") {
        response.push_str("[Authenticated]");
    } else {
        response.push_str("[Not Authenticated]");
    }
    Ok(response)
}

async fn hi(_req: Req) -> Res {
    Res::redirect("/hello")
}

#[derive(Deserialize)]
struct GoBack {
    year: u32,
}

async fn go_back(Path(GoBack { year }): Path<GoBack>, _req: Req) -> String {
    format!("Welcome to {}!", 2018 - i64::from(year))
}

async fn three_colors(req: Req) -> Result<&'static str> {
    match req.param("color") {
        Some("blue" | "white" | "red") => Ok(
            "<p>Love is patient and kind. Love is not jealous or boastful or proud or rude.</p>",
        ),
        _ => Err(Error::status(404)),
    }
}

async fn teapot(req: Req) -> Result<&'static str> {
    if req.param("drink") == Some("coffee") {
        return Err(Error::status(418));
    }
    Ok("A drop of tea.")
}

async fn not_found(_req: Req) -> Error {
    Error::status(404)
}

const NOTE_TEXT: &str = "Note
to: Peter
from: Jane
heading: Reminder
body: Don't forget the party!
";

const NOTE_HTML: &str = "<!DOCTYPE html>
<html>
<head></head>
<body>
  <h1>Note</h1>
  <p>to: Peter</p>
  <p>from: Jane</p>
  <p>heading: Reminder</p>
  <p>body: <strong>Don't forget the party!</strong></p>
</body>
</html>
";

const NOTE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<note>
  <to>Peter</to>
  <from>Jane</from>
  <heading>Reminder</heading>
  <body>Don't forget the party!</body>
</note>
"#;

/// The same note as text, HTML, XML or JSON.
async fn note(req: Req) -> Result<Res> {
    let content_type = req.param("content_type").unwrap_or("text").to_lowercase();
    match content_type.as_str() {
        "text" => Ok(Res::text(NOTE_TEXT)),
        "html" => Ok(Res::html(NOTE_HTML)),
        "xml" => Ok(Res::xml(NOTE_XML)),
        "json" => Ok(Res::json(&serde_json::json!({
            "note": {
                "to": "Peter",
                "from": "Jane",
                "heading": "Reminder",
                "body": "Don't forget the party!",
            }
        }))),
        _ => Err(Error::status(400)),
    }
}

async fn set_cookie(req: Req) -> Res {
    let name = req.param("name").unwrap_or_default();
    Res::redirect("/hello").set_cookie(Cookie::new("name", name))
}

async fn login(req: Req) -> Result<Res> {
    req.session()?.insert("logged_in", true);
    Ok(Res::redirect("/hello"))
}

async fn logout(req: Req) -> Result<Res> {
    req.session()?.remove("logged_in");
    Ok(Res::redirect("/hello"))
}

async fn require_login(req: Req, _state: Arc<()>, next: Next<()>) -> Res {
    match req.session() {
        Ok(session) if session.contains("logged_in") => next.run(req).await,
        Ok(_) => Error::status(403).into_res(),
        Err(e) => e.into_res(),
    }
}

async fn admin(_req: Req) -> &'static str {
    "Welcome to admin page."
}

fn lorem_paragraphs(n: usize) -> String {
    (0..n)
        .map(|i| {
            let words = if i == 0 {
                lipsum::lipsum(60)
            } else {
                lipsum::lipsum_words(60)
            };
            format!("<p>{}</p>", words)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn show_post(_req: Req) -> String {
    format!(
        r#"
<h1>A very long post</h1>
<div class="body">{}</div>
<button id="load">Load More</button>
<script src="https://code.jquery.com/jquery-3.3.1.min.js"></script>
<script type="text/javascript">
$(function() {{
    $('#load').click(function() {{
        $.ajax({{
            url: '/more',
            type: 'get',
            success: function(data){{
                $('.body').append(data);
            }}
        }})
    }})
}})
</script>"#,
        lorem_paragraphs(3)
    )
}

async fn load_post(_req: Req) -> String {
    format!("<p>{}</p>", lipsum::lipsum_words(60))
}

/// Link to `/do-something` that brings the user back here.
fn do_something_link(req: &Req) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", &req.full_path())
        .finish();
    format!("/do-something?{}", query)
}

async fn foo(req: Req) -> String {
    format!(
        r#"<h1>Foo page</h1><a href="{}">Do something and redirect</a>"#,
        do_something_link(&req)
    )
}

async fn bar(req: Req) -> String {
    format!(
        r#"<h1>Bar page</h1><a href="{}">Do something and redirect</a>"#,
        do_something_link(&req)
    )
}

async fn do_something(req: Req) -> Res {
    redirect_back(&req, "/hello")
}
