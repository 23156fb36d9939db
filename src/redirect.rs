//! Safe "redirect back" resolution.
//!
//! Redirect targets taken from the `Referer` header or a `next` query
//! parameter are attacker controlled. A target is only followed when,
//! joined onto the app's own host URL, it stays on `http`/`https` and on
//! exactly the same network location. An absolute target must spell the
//! authority byte for byte like the host does: `EXAMPLE.com` or an explicit
//! `:80` do not match `example.com`.

use url::Url;

use crate::{Req, Res};

/// Picks the first candidate that stays on the current host.
#[derive(Debug, Clone)]
pub struct SafeRedirect {
    host: Url,
    authority: String,
}

impl SafeRedirect {
    /// Resolver anchored at `host_url` (`http://example.com/`).
    ///
    /// Returns `None` if `host_url` is not an absolute URL.
    pub fn new(host_url: &str) -> Option<Self> {
        let host = Url::parse(host_url).ok()?;
        let authority = match raw_authority(host_url) {
            Some(authority) => authority.to_string(),
            None => netloc(&host),
        };
        Some(Self { host, authority })
    }

    /// Resolver anchored at the request's own host.
    pub fn for_request(req: &Req) -> Option<Self> {
        Self::new(&req.host_url())
    }

    /// `target` joined onto the host, if it is safe to redirect to.
    pub fn check(&self, target: &str) -> Option<Url> {
        let resolved = self.host.join(target).ok()?;
        let authority = raw_authority(target).unwrap_or(self.authority.as_str());
        let safe = matches!(resolved.scheme(), "http" | "https")
            && netloc(&resolved) == netloc(&self.host)
            && authority == self.authority;
        safe.then_some(resolved)
    }

    /// First safe candidate, resolved against the host, or `default`.
    ///
    /// Candidates are tried in order; absent and empty ones are skipped.
    pub fn resolve<'a, I>(&self, candidates: I, default: &str) -> String
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        candidates
            .into_iter()
            .flatten()
            .filter(|target| !target.is_empty())
            .find_map(|target| {
                let resolved = self.check(target);
                if resolved.is_none() {
                    tracing::warn!(candidate = target, host = %self.host, "refusing unsafe redirect target");
                }
                resolved
            })
            .map(String::from)
            .unwrap_or_else(|| default.to_string())
    }
}

/// Userinfo, host and explicit port: everything between `//` and the path.
fn netloc(url: &Url) -> String {
    let mut out = String::new();
    if !url.username().is_empty() || url.password().is_some() {
        out.push_str(url.username());
        if let Some(password) = url.password() {
            out.push(':');
            out.push_str(password);
        }
        out.push('@');
    }
    out.push_str(url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out
}

/// Authority as written in `target`: the text after `//` up to the path,
/// query or fragment. `None` for targets without one, which inherit the
/// host's.
fn raw_authority(target: &str) -> Option<&str> {
    let rest = match target.split_once(':') {
        Some((scheme, rest)) if is_scheme(scheme) => rest,
        _ => target,
    };
    let rest = rest.strip_prefix("//")?;
    let end = rest.find(['/', '?', '#', '\\']).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Redirect to the referring page or the `next` query parameter when
/// either stays on this host, else to `default`.
pub fn redirect_back(req: &Req, default: &str) -> Res {
    let next = req.query_value("next");
    let target = match SafeRedirect::for_request(req) {
        Some(resolver) => resolver.resolve([req.referrer(), next.as_deref()], default),
        None => default.to_string(),
    };
    Res::redirect(target)
}
