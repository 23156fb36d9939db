//! Forms: plain HTML, validated forms, custom validators, file uploads,
//! several submit buttons or forms on one page and a rich-text editor.

pub mod forms;

use lantern::extractors::State;
use lantern::form::{CSRF_FIELD, check_csrf};
use lantern::upload::{allowed_file, random_filename, secure_filename};
use lantern::{
    App, Config, FormState, IntoRes, Method, Req, Res, Result, SessionLayer, Submission,
    Templates, Validator, validate_form, validate_on_submit,
};
use minijinja::context;
use serde_json::json;

use crate::forms::{
    FortyTwoForm, LoginForm, NewPostForm, RegisterForm, RegisterForm2, RichTextForm, SigninForm,
    SigninForm2,
};

const TEMPLATES: [(&str, &str); 15] = [
    ("base.html", include_str!("../templates/base.html")),
    ("_macros.html", include_str!("../templates/_macros.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("pure_html.html", include_str!("../templates/pure_html.html")),
    ("basic.html", include_str!("../templates/basic.html")),
    ("bootstrap.html", include_str!("../templates/bootstrap.html")),
    ("custom_validator.html", include_str!("../templates/custom_validator.html")),
    ("upload.html", include_str!("../templates/upload.html")),
    ("uploaded.html", include_str!("../templates/uploaded.html")),
    ("dropzone.html", include_str!("../templates/dropzone.html")),
    ("2submit.html", include_str!("../templates/2submit.html")),
    ("2form.html", include_str!("../templates/2form.html")),
    ("2form2view.html", include_str!("../templates/2form2view.html")),
    ("ckeditor.html", include_str!("../templates/ckeditor.html")),
    ("post.html", include_str!("../templates/post.html")),
];

/// Extensions accepted by the single upload form.
const PHOTO_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Shared state: templates and settings.
pub struct FormDemo {
    templates: Templates,
    config: Config,
}

impl FormDemo {
    fn allowed_extensions(&self) -> Vec<&str> {
        self.config
            .allowed_extensions
            .iter()
            .map(String::as_str)
            .collect()
    }
}

/// Build the app. Creates the upload directory if needed.
pub fn app(config: Config) -> Result<App<FormDemo>> {
    std::fs::create_dir_all(&config.upload_path)?;

    let mut templates = Templates::new();
    for (name, source) in TEMPLATES {
        templates.add_template(name, source)?;
    }

    let secret = config.secret_key.clone();
    let max_body_size = config.max_body_size;
    let mut app = App::with_state(FormDemo { templates, config });
    app.layer(SessionLayer::new(secret));
    app.max_body_size(max_body_size);

    let get_post = [Method::GET, Method::POST];
    app.methods(&get_post, "/", index);
    app.methods(&get_post, "/html", html);
    app.methods(&get_post, "/basic", basic);
    app.methods(&get_post, "/bootstrap", bootstrap);
    app.methods(&get_post, "/custom-validator", custom_validator);
    app.get("/uploads/{*filename}", get_file);
    app.get("/uploaded-images", show_images);
    app.methods(&get_post, "/upload", upload);
    app.methods(&get_post, "/multi-upload", multi_upload);
    app.methods(&get_post, "/dropzone-upload", dropzone_upload);
    app.methods(&get_post, "/two-submits", two_submits);
    app.methods(&get_post, "/multi-form", multi_form);
    app.get("/multi-form-multi-view", multi_form_multi_view);
    app.post("/handle-signin", handle_signin);
    app.post("/handle-register", handle_register);
    app.methods(&get_post, "/ckeditor", integrate_ckeditor);
    app.post("/upload-ck", upload_for_ckeditor);
    Ok(app)
}

fn is_post(req: &Req) -> bool {
    *req.method() == Method::POST
}

async fn index(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    demo.templates.render(&req, "index.html", context! {})
}

/// A form written by hand: no validation, no CSRF token.
async fn html(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    if is_post(&req) {
        let username = req.form_value("username").unwrap_or_default();
        req.session()?.flash(format!("Welcome home, {}!", username));
        return Ok(Res::redirect("/"));
    }
    demo.templates.render(&req, "pure_html.html", context! {})
}

async fn login_page(demo: &FormDemo, req: &Req, template: &str) -> Result<Res> {
    match validate_on_submit::<LoginForm>(req).await? {
        Submission::Valid(form) => {
            req.session()?
                .flash(format!("Welcome home, {}!", form.username));
            Ok(Res::redirect("/"))
        }
        other => demo
            .templates
            .render(req, template, context! { form => other.state() }),
    }
}

async fn basic(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    login_page(&demo, &req, "basic.html").await
}

async fn bootstrap(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    login_page(&demo, &req, "bootstrap.html").await
}

async fn custom_validator(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    match validate_on_submit::<FortyTwoForm>(&req).await? {
        Submission::Valid(_) => {
            req.session()?.flash("Bingo!");
            Ok(Res::redirect("/"))
        }
        other => demo
            .templates
            .render(&req, "custom_validator.html", context! { form => other.state() }),
    }
}

async fn get_file(State(demo): State<FormDemo>, req: Req) -> Res {
    let filename = req.param("filename").unwrap_or_default();
    Res::from_directory(&demo.config.upload_path, filename).await
}

async fn show_images(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    let filenames: Vec<String> = req.session()?.get("filenames").unwrap_or_default();
    demo.templates
        .render(&req, "uploaded.html", context! { filenames => filenames })
}

/// Single image upload, validated like any other form.
async fn upload(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    let mut form = FormState::default();
    if is_post(&req) {
        let multipart = req.multipart().await?;
        let session = req.session()?;
        let photo = multipart.file("photo");

        let mut v = Validator::new();
        if let Err(message) = check_csrf(&session, multipart.value(CSRF_FIELD)) {
            v.error(CSRF_FIELD, message);
        }
        v.file_required("photo", photo)
            .file_allowed("photo", photo, &PHOTO_EXTENSIONS);

        match photo {
            Some(photo) if v.is_valid() => {
                let filename = random_filename(&photo.file_name);
                photo.save(&demo.config.upload_path, &filename).await?;
                session.flash("Upload success.");
                session.insert("filenames", vec![filename]);
                return Ok(Res::redirect("/uploaded-images"));
            }
            _ => form = FormState::new(multipart.values(), v.into_errors()),
        }
    }
    demo.templates
        .render(&req, "upload.html", context! { form => form, multiple => false })
}

/// Several images at once, checked by hand.
async fn multi_upload(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    if !is_post(&req) {
        return demo.templates.render(
            &req,
            "upload.html",
            context! { form => FormState::default(), multiple => true },
        );
    }

    let multipart = req.multipart().await?;
    let session = req.session()?;
    if check_csrf(&session, multipart.value(CSRF_FIELD)).is_err() {
        session.flash("CSRF token error.");
        return Ok(Res::redirect("/multi-upload"));
    }

    let photos = multipart.files("photo");
    if photos.is_empty() {
        session.flash("This field is required.");
        return Ok(Res::redirect("/multi-upload"));
    }

    let allowed = demo.allowed_extensions();
    if !photos.iter().all(|photo| allowed_file(&photo.file_name, &allowed)) {
        session.flash("Invalid file type.");
        return Ok(Res::redirect("/multi-upload"));
    }

    let mut filenames = Vec::with_capacity(photos.len());
    for photo in photos {
        let filename = random_filename(&photo.file_name);
        photo.save(&demo.config.upload_path, &filename).await?;
        filenames.push(filename);
    }

    session.flash("Upload success.");
    session.insert("filenames", filenames);
    Ok(Res::redirect("/uploaded-images"))
}

/// Target of the drag-and-drop widget; errors go back as plain 400s.
async fn dropzone_upload(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    if is_post(&req) {
        let multipart = req.multipart().await?;
        let Some(file) = multipart.file("file") else {
            return Ok((400, "This field is required.").into_res());
        };
        if !allowed_file(&file.file_name, &demo.allowed_extensions()) {
            return Ok((400, "Invalid file type.").into_res());
        }
        file.save(&demo.config.upload_path, &random_filename(&file.file_name))
            .await?;
    }
    demo.templates.render(
        &req,
        "dropzone.html",
        context! {
            dropzone_max_file_size => demo.config.dropzone_max_file_size,
            dropzone_max_files => demo.config.dropzone_max_files,
        },
    )
}

async fn two_submits(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    match validate_on_submit::<NewPostForm>(&req).await? {
        Submission::Valid(form) => {
            let session = req.session()?;
            if form.save.is_some() {
                session.flash("You click the \"Save\" button.");
            } else if form.publish.is_some() {
                session.flash("You click the \"Publish\" button.");
            }
            Ok(Res::redirect("/"))
        }
        other => demo
            .templates
            .render(&req, "2submit.html", context! { form => other.state() }),
    }
}

/// Two forms posting to one view, told apart by their submit buttons.
async fn multi_form(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    let mut signin_form = FormState::default();
    let mut register_form = FormState::default();

    if is_post(&req) && req.form_value("submit1").is_some() {
        match validate_form::<SigninForm>(&req).await? {
            Ok(form) => {
                req.session()?
                    .flash(format!("{}, you just submit the Signin Form.", form.username));
                return Ok(Res::redirect("/"));
            }
            Err(state) => signin_form = state,
        }
    } else if is_post(&req) && req.form_value("submit2").is_some() {
        match validate_form::<RegisterForm>(&req).await? {
            Ok(form) => {
                req.session()?
                    .flash(format!("{}, you just submit the Register Form.", form.username));
                return Ok(Res::redirect("/"));
            }
            Err(state) => register_form = state,
        }
    }

    demo.templates.render(
        &req,
        "2form.html",
        context! { signin_form => signin_form, register_form => register_form },
    )
}

async fn multi_form_multi_view(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    demo.templates.render(
        &req,
        "2form2view.html",
        context! { signin_form => FormState::default(), register_form => FormState::default() },
    )
}

async fn handle_signin(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    match validate_on_submit::<SigninForm2>(&req).await? {
        Submission::Valid(form) => {
            req.session()?
                .flash(format!("{}, you just submit the Signin Form.", form.username));
            Ok(Res::redirect("/"))
        }
        other => demo.templates.render(
            &req,
            "2form2view.html",
            context! { signin_form => other.state(), register_form => FormState::default() },
        ),
    }
}

async fn handle_register(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    match validate_on_submit::<RegisterForm2>(&req).await? {
        Submission::Valid(form) => {
            req.session()?
                .flash(format!("{}, you just submit the Register Form.", form.username));
            Ok(Res::redirect("/"))
        }
        other => demo.templates.render(
            &req,
            "2form2view.html",
            context! { signin_form => FormState::default(), register_form => other.state() },
        ),
    }
}

async fn integrate_ckeditor(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    match validate_on_submit::<RichTextForm>(&req).await? {
        Submission::Valid(form) => {
            req.session()?.flash("Your post is published!");
            demo.templates.render(
                &req,
                "post.html",
                context! { title => form.title, body => form.body },
            )
        }
        other => demo
            .templates
            .render(&req, "ckeditor.html", context! { form => other.state() }),
    }
}

fn upload_success(url: &str, filename: &str) -> Res {
    Res::json(&json!({ "uploaded": 1, "fileName": filename, "url": url }))
}

fn upload_fail(message: &str) -> Res {
    Res::json(&json!({ "uploaded": 0, "error": { "message": message } }))
}

/// Image upload endpoint for the rich-text editor.
async fn upload_for_ckeditor(State(demo): State<FormDemo>, req: Req) -> Result<Res> {
    let multipart = req.multipart().await?;
    let Some(file) = multipart.file("upload") else {
        return Ok(upload_fail("This field is required."));
    };
    let allowed = demo.allowed_extensions();
    let filename = match secure_filename(&file.file_name) {
        Some(name) if allowed_file(&name, &allowed) => name,
        _ => return Ok(upload_fail("Image only!")),
    };
    file.save(&demo.config.upload_path, &filename).await?;
    Ok(upload_success(&format!("/uploads/{}", filename), &filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hyper::Request;
    use lantern::session::SessionSigner;
    use serde_json::{Map, Value};

    const SECRET: &str = "secret string";
    const TOKEN: &str = "0123456789abcdef";
    const BOUNDARY: &str = "LanternBoundary";

    struct Harness {
        app: App<FormDemo>,
        dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            secret_key: SECRET.to_string(),
            upload_path: dir.path().join("uploads"),
            ..Config::default()
        };
        Harness {
            app: app(config).unwrap(),
            dir,
        }
    }

    fn session_cookie() -> String {
        let mut data = Map::new();
        data.insert("csrf_token".into(), Value::String(TOKEN.into()));
        format!("session={}", SessionSigner::new(SECRET).encode(&data))
    }

    fn session_data(res: &Res) -> Map<String, Value> {
        let value = res
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| v.strip_prefix("session="))
            .and_then(|v| v.split(';').next())
            .unwrap();
        SessionSigner::new(SECRET).decode(value).unwrap()
    }

    fn flashes(res: &Res) -> Vec<String> {
        session_data(res)
            .get("_flashes")
            .and_then(Value::as_array)
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|m| m.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn post_form(path: &str, body: &str) -> Request<Bytes> {
        Request::post(path)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("cookie", session_cookie())
            .body(Bytes::from(body.to_string()))
            .unwrap()
    }

    fn post_multipart(path: &str, fields: &[(&str, &str)], files: &[(&str, &str)]) -> Request<Bytes> {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        for (name, filename) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\nDATA\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::post(path)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("cookie", session_cookie())
            .body(Bytes::from(body))
            .unwrap()
    }

    fn get(path: &str) -> Request<Bytes> {
        Request::get(path)
            .header("cookie", session_cookie())
            .body(Bytes::new())
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_lists_demos() {
        let mut h = harness();
        let res = h.app.call(get("/")).await;
        assert_eq!(res.status_code(), 200);
        let body = res.into_text().await.unwrap();
        assert!(body.contains(r#"<a href="/multi-form-multi-view">"#));
    }

    #[tokio::test]
    async fn test_pure_html_form_flashes_username() {
        let mut h = harness();
        let res = h.app.call(post_form("/html", "username=grey&password=x")).await;
        assert_eq!(res.headers()["location"], "/");
        assert_eq!(flashes(&res), ["Welcome home, grey!"]);
    }

    #[tokio::test]
    async fn test_basic_form_renders_csrf_token() {
        let mut h = harness();
        let res = h.app.call(get("/basic")).await;
        let body = res.into_text().await.unwrap();
        assert!(body.contains(&format!(r#"name="csrf_token" value="{TOKEN}""#)), "{body}");
    }

    #[tokio::test]
    async fn test_basic_form_valid_and_invalid() {
        let mut h = harness();
        let res = h
            .app
            .call(post_form(
                "/basic",
                &format!("csrf_token={TOKEN}&username=grey&password=12345678"),
            ))
            .await;
        assert_eq!(res.status_code(), 302);
        assert_eq!(flashes(&res), ["Welcome home, grey!"]);

        let res = h
            .app
            .call(post_form("/bootstrap", "csrf_token=forged&username=grey&password=123"))
            .await;
        assert_eq!(res.status_code(), 200);
        let body = res.into_text().await.unwrap();
        assert!(body.contains("The CSRF token is invalid."));
        assert!(body.contains("Field must be between 8 and 128 characters long."));
        assert!(body.contains(r#"value="grey""#));
    }

    #[tokio::test]
    async fn test_custom_validator() {
        let mut h = harness();
        let res = h
            .app
            .call(post_form(
                "/custom-validator",
                &format!("csrf_token={TOKEN}&answer=41&answer2=43&remember=y"),
            ))
            .await;
        let body = res.into_text().await.unwrap();
        assert!(body.contains("Must be 42."));
        assert!(body.contains("Must be false."));
        assert!(!body.contains("Must be 43."));

        let res = h
            .app
            .call(post_form(
                "/custom-validator",
                &format!("csrf_token={TOKEN}&answer=42&answer2=43"),
            ))
            .await;
        assert_eq!(flashes(&res), ["Bingo!"]);
    }

    #[tokio::test]
    async fn test_single_upload_saves_and_lists() {
        let mut h = harness();
        let res = h
            .app
            .call(post_multipart(
                "/upload",
                &[("csrf_token", TOKEN)],
                &[("photo", "cat.PNG")],
            ))
            .await;
        assert_eq!(res.headers()["location"], "/uploaded-images");
        let data = session_data(&res);
        assert_eq!(flashes(&res), ["Upload success."]);
        let filename = data["filenames"][0].as_str().unwrap().to_string();
        assert!(filename.ends_with(".PNG"));
        assert!(h.dir.path().join("uploads").join(&filename).exists());

        let res = h.app.call(get(&format!("/uploads/{filename}"))).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.headers()["content-type"], "image/png");
        assert_eq!(res.into_text().await.unwrap(), "DATA");
    }

    #[tokio::test]
    async fn test_single_upload_rejects_bad_extension() {
        let mut h = harness();
        let res = h
            .app
            .call(post_multipart(
                "/upload",
                &[("csrf_token", TOKEN)],
                &[("photo", "notes.txt")],
            ))
            .await;
        assert_eq!(res.status_code(), 200);
        let body = res.into_text().await.unwrap();
        assert!(body.contains("File does not have an approved extension: jpg, jpeg, png, gif"));
    }

    #[tokio::test]
    async fn test_multi_upload_checks() {
        let mut h = harness();
        let res = h
            .app
            .call(post_multipart("/multi-upload", &[("csrf_token", "bad")], &[("photo", "a.png")]))
            .await;
        assert_eq!(res.headers()["location"], "/multi-upload");
        assert_eq!(flashes(&res), ["CSRF token error."]);

        let res = h
            .app
            .call(post_multipart("/multi-upload", &[("csrf_token", TOKEN)], &[]))
            .await;
        assert_eq!(flashes(&res), ["This field is required."]);

        let res = h
            .app
            .call(post_multipart(
                "/multi-upload",
                &[("csrf_token", TOKEN)],
                &[("photo", "a.png"), ("photo", "b.exe")],
            ))
            .await;
        assert_eq!(flashes(&res), ["Invalid file type."]);
        let saved = std::fs::read_dir(h.dir.path().join("uploads")).unwrap().count();
        assert_eq!(saved, 0);

        let res = h
            .app
            .call(post_multipart(
                "/multi-upload",
                &[("csrf_token", TOKEN)],
                &[("photo", "a.png"), ("photo", "b.gif")],
            ))
            .await;
        assert_eq!(res.headers()["location"], "/uploaded-images");
        assert_eq!(session_data(&res)["filenames"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dropzone_errors_are_400() {
        let mut h = harness();
        let res = h
            .app
            .call(post_multipart("/dropzone-upload", &[("note", "empty")], &[]))
            .await;
        assert_eq!(res.status_code(), 400);
        assert_eq!(res.into_text().await.unwrap(), "This field is required.");

        let res = h
            .app
            .call(post_multipart("/dropzone-upload", &[], &[("file", "x.txt")]))
            .await;
        assert_eq!(res.status_code(), 400);
        assert_eq!(res.into_text().await.unwrap(), "Invalid file type.");

        let res = h
            .app
            .call(post_multipart("/dropzone-upload", &[], &[("file", "x.jpg")]))
            .await;
        assert_eq!(res.status_code(), 200);
        assert!(res.into_text().await.unwrap().contains("maxFiles: 30"));
    }

    #[tokio::test]
    async fn test_two_submit_buttons() {
        let mut h = harness();
        let res = h
            .app
            .call(post_form(
                "/two-submits",
                &format!("csrf_token={TOKEN}&title=Hi&body=There&save=Save"),
            ))
            .await;
        assert_eq!(flashes(&res), ["You click the \"Save\" button."]);

        let res = h
            .app
            .call(post_form(
                "/two-submits",
                &format!("csrf_token={TOKEN}&title=Hi&body=There&publish=Publish"),
            ))
            .await;
        assert_eq!(flashes(&res), ["You click the \"Publish\" button."]);
    }

    #[tokio::test]
    async fn test_multi_form_dispatches_on_submit_field() {
        let mut h = harness();
        let res = h
            .app
            .call(post_form(
                "/multi-form",
                &format!("csrf_token={TOKEN}&username=grey&password=12345678&submit1=Sign+in"),
            ))
            .await;
        assert_eq!(flashes(&res), ["grey, you just submit the Signin Form."]);

        let res = h
            .app
            .call(post_form(
                "/multi-form",
                &format!("csrf_token={TOKEN}&username=grey&email=bad&password=12345678&submit2=Register"),
            ))
            .await;
        assert_eq!(res.status_code(), 200);
        assert!(res.into_text().await.unwrap().contains("Invalid email address."));
    }

    #[tokio::test]
    async fn test_multi_view_handlers() {
        let mut h = harness();
        assert_eq!(h.app.call(get("/multi-form-multi-view")).await.status_code(), 200);
        assert_eq!(h.app.call(get("/handle-signin")).await.status_code(), 405);

        let res = h
            .app
            .call(post_form(
                "/handle-register",
                &format!("csrf_token={TOKEN}&username=grey&email=grey@example.com&password=12345678"),
            ))
            .await;
        assert_eq!(flashes(&res), ["grey, you just submit the Register Form."]);

        let res = h
            .app
            .call(post_form("/handle-signin", &format!("csrf_token={TOKEN}&username=grey")))
            .await;
        assert!(res.into_text().await.unwrap().contains("This field is required."));
    }

    #[tokio::test]
    async fn test_ckeditor_post_renders_body() {
        let mut h = harness();
        let res = h
            .app
            .call(post_form(
                "/ckeditor",
                &format!("csrf_token={TOKEN}&title=Hello&body=%3Cp%3ERich%3C%2Fp%3E"),
            ))
            .await;
        assert_eq!(res.status_code(), 200);
        let body = res.into_text().await.unwrap();
        assert!(body.contains("<h1>Hello</h1>"));
        assert!(body.contains("<p>Rich</p>"));
        assert!(body.contains("Your post is published!"));
    }

    #[tokio::test]
    async fn test_ckeditor_upload_json() {
        let mut h = harness();
        let res = h
            .app
            .call(post_multipart("/upload-ck", &[], &[("upload", "../my photo.jpg")]))
            .await;
        let json: Value = serde_json::from_str(&res.into_text().await.unwrap()).unwrap();
        assert_eq!(json["uploaded"], 1);
        assert_eq!(json["fileName"], "my_photo.jpg");
        assert_eq!(json["url"], "/uploads/my_photo.jpg");

        let res = h
            .app
            .call(post_multipart("/upload-ck", &[], &[("upload", "doc.pdf")]))
            .await;
        let json: Value = serde_json::from_str(&res.into_text().await.unwrap()).unwrap();
        assert_eq!(json["uploaded"], 0);
        assert_eq!(json["error"]["message"], "Image only!");
    }

    #[tokio::test]
    async fn test_uploads_cannot_escape_directory() {
        let mut h = harness();
        let res = h.app.call(get("/uploads/../Cargo.toml")).await;
        assert_eq!(res.status_code(), 404);
    }
}
