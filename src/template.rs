//! HTML templates.
//!
//! Thin layer over a [`minijinja::Environment`] that adds the per-request
//! values every page needs: queued flash messages (`flashes`), the session's
//! CSRF token (`csrf_token`) and whatever the registered context processors
//! return.

use std::collections::BTreeMap;

use minijinja::functions::Function;
use minijinja::value::{FunctionArgs, FunctionResult};
use minijinja::{Environment, Value};
use serde::Serialize;

use crate::{Req, Res, Result};

type ContextProcessor = Box<dyn Fn(&Req) -> BTreeMap<String, Value> + Send + Sync>;

/// Template environment plus request-aware rendering.
pub struct Templates {
    env: Environment<'static>,
    processors: Vec<ContextProcessor>,
}

impl Templates {
    /// Environment with block trimming and HTML autoescape for `.html`.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        Self {
            env,
            processors: Vec::new(),
        }
    }

    /// Register a template source under `name`.
    pub fn add_template(&mut self, name: &'static str, source: &'static str) -> Result<()> {
        self.env.add_template(name, source)?;
        Ok(())
    }

    /// Register a value visible to every template.
    pub fn add_global(&mut self, name: &'static str, value: impl Into<Value>) {
        self.env.add_global(name, value.into());
    }

    /// Register a filter, used as `{{ value|name }}`.
    pub fn add_filter<F, Rv, Args>(&mut self, name: &'static str, f: F)
    where
        F: Function<Rv, Args> + for<'a> Function<Rv, <Args as FunctionArgs<'a>>::Output>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        self.env.add_filter::<_, F, Rv, Args>(name, f);
    }

    /// Register a test, used as `{% if value is name %}`.
    pub fn add_test<F, Rv, Args>(&mut self, name: &'static str, f: F)
    where
        F: Function<Rv, Args> + for<'a> Function<Rv, <Args as FunctionArgs<'a>>::Output>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        self.env.add_test::<_, F, Rv, Args>(name, f);
    }

    /// Register a global function.
    pub fn add_function<F, Rv, Args>(&mut self, name: &'static str, f: F)
    where
        F: Function<Rv, Args> + for<'a> Function<Rv, <Args as FunctionArgs<'a>>::Output>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        self.env.add_function::<_, F, Rv, Args>(name, f);
    }

    /// Direct access to the underlying environment.
    pub fn env_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    /// Add values computed from the request to every render.
    pub fn context_processor<F>(&mut self, processor: F)
    where
        F: Fn(&Req) -> BTreeMap<String, Value> + Send + Sync + 'static,
    {
        self.processors.push(Box::new(processor));
    }

    /// Render `name` for `req` as an HTML response.
    ///
    /// Takes the session's flash messages, so they show exactly once.
    pub fn render<C: Serialize>(&self, req: &Req, name: &str, ctx: C) -> Result<Res> {
        let (flashes, csrf_token) = match req.session() {
            Ok(session) => (session.take_flashes(), session.csrf_token()),
            Err(_) => (Vec::new(), String::new()),
        };
        let mut page = BTreeMap::new();
        for processor in &self.processors {
            page.extend(processor(req));
        }
        let ctx = Value::from_serialize(&ctx);
        if let Ok(keys) = ctx.try_iter() {
            for key in keys {
                if let (Some(k), Ok(v)) = (key.as_str(), ctx.get_item(&key)) {
                    page.insert(k.to_string(), v);
                }
            }
        }
        page.insert("flashes".to_string(), Value::from_serialize(&flashes));
        page.insert("csrf_token".to_string(), Value::from(csrf_token));

        let html = self.env.get_template(name)?.render(page)?;
        Ok(Res::html(html))
    }

    /// Render without a request, e.g. from an error handler.
    pub fn render_to_string<C: Serialize>(&self, name: &str, ctx: C) -> Result<String> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("processors", &self.processors.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Session;
    use bytes::Bytes;
    use hyper::Request;
    use minijinja::context;

    fn req_with_session(session: &Session) -> Req {
        let mut req = Req::new(Request::get("/").body(Bytes::new()).unwrap());
        req.extensions_mut().insert(session.clone());
        req
    }

    #[tokio::test]
    async fn test_render_injects_flashes_and_processors() {
        let mut templates = Templates::new();
        templates
            .add_template(
                "page.html",
                "{% for m in flashes %}[{{ m }}]{% endfor %}{{ foo }} {{ name }}",
            )
            .unwrap();
        templates.context_processor(|_req| {
            BTreeMap::from([("foo".to_string(), Value::from("I am foo."))])
        });

        let session = Session::default();
        session.flash("<b>hi");
        let req = req_with_session(&session);

        let res = templates
            .render(&req, "page.html", context! { name => "Grey" })
            .unwrap();
        let body = res.into_text().await.unwrap();
        assert_eq!(body, "[&lt;b&gt;hi]I am foo. Grey");
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn test_trim_blocks() {
        let mut templates = Templates::new();
        templates
            .add_template("list.html", "<ul>\n  {% for i in items %}\n  <li>{{ i }}</li>\n  {% endfor %}\n</ul>")
            .unwrap();
        let out = templates
            .render_to_string("list.html", context! { items => vec![1, 2] })
            .unwrap();
        assert_eq!(out, "<ul>\n  <li>1</li>\n  <li>2</li>\n</ul>");
    }

    #[test]
    fn test_custom_filter_test_and_function() {
        let mut templates = Templates::new();
        templates.add_filter("shout", |value: String| value.to_uppercase());
        templates.add_test("short", |value: String| value.len() < 4);
        templates.add_function("greeting", || "hi");
        templates.add_global("answer", 42);
        templates
            .add_template(
                "custom.html",
                "{{ name|shout }} {% if name is short %}short{% endif %} {{ greeting() }} {{ answer }}",
            )
            .unwrap();
        let out = templates
            .render_to_string("custom.html", context! { name => "bob" })
            .unwrap();
        assert_eq!(out, "BOB short hi 42");
    }

    #[test]
    fn test_missing_template_is_server_error() {
        let templates = Templates::new();
        let err = templates.render_to_string("nope.html", ()).unwrap_err();
        assert_eq!(err.status_code(), 500);
    }
}
