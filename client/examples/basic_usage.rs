use std::collections::HashMap;
use std::process::exit;

use courier_client::{
    compose_url, BasicRequestEncoder, HttpMethod, JsonResponseParser, QueryParam, RequestEncoder,
    Session, UrlBuilder,
};
use url::Url;

/// Builder for a demo backend that supports a shouted, localized rendering
/// of every text: wraps the base composition and appends the fixed flags.
struct DemoUrlBuilder {
    base: Url,
    shout: bool,
    language: Option<String>,
}

impl UrlBuilder for DemoUrlBuilder {
    fn base_url(&self) -> &Url {
        &self.base
    }

    fn build_url(&self, path: &str, parameters: &[QueryParam]) -> Option<Url> {
        let mut parameters = parameters.to_vec();
        if self.shout {
            parameters.push(QueryParam::flag("shoutcloud"));
        }
        if let Some(code) = &self.language {
            parameters.push(QueryParam::new("i18n", code.clone()));
        }
        compose_url(self.base_url(), path, &parameters)
    }
}

#[tokio::main]
async fn main() {
    // Expect the backend base URL as the first argument and an optional
    // locale code after it
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <base_url> [locale]", args[0]);
        exit(1);
    }

    let base = match Url::parse(&args[1]) {
        Ok(base) => base,
        Err(e) => {
            eprintln!("Invalid base URL: {}", e);
            exit(1);
        }
    };

    let builder = DemoUrlBuilder {
        base,
        shout: true,
        language: args.get(2).cloned(),
    };

    // GET /<category>/<name>/<modifier>
    let url = match builder.build_url_bare("/greetings/Ada/terminal") {
        Some(url) => url,
        None => {
            eprintln!("Base URL cannot carry path segments");
            exit(1);
        }
    };
    println!("Requesting {}", url);

    let request = BasicRequestEncoder
        .encode(&url, HttpMethod::GET, None, &HashMap::new())
        .expect("basic requests cannot fail to encode");

    let session = Session::default();
    let (tx, rx) = tokio::sync::oneshot::channel();
    session.execute(
        request,
        JsonResponseParser::<HashMap<String, serde_json::Value>, ()>::new(),
        move |result| {
            let _ = tx.send(result);
        },
    );

    match rx.await.expect("completion callback always fires") {
        Ok(fields) => {
            for (key, value) in &fields {
                println!("{}: {}", key, value);
            }
        }
        Err(error) => {
            eprintln!("Request failed: {}", error);
            exit(1);
        }
    }
}
