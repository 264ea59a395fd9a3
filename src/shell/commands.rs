use crate::domain::{ShortUrl, TokenClaims};
use crate::protocol::network::{ApiClient, PagedList};
use crate::shell::{Args, Command};
use crate::store::{FileStore, TokenStore};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub async fn run(args: Args) -> anyhow::Result<()> {
    let store = FileStore::open(&args.token_file)
        .with_context(|| format!("opening {}", args.token_file.display()))?;
    let tokens = TokenStore::new(Arc::new(store));
    let client = ApiClient::builder()
        .base_url(&args.base_url)
        .token_store(tokens)
        .refresh_timeout(Duration::from_secs(args.refresh_timeout))
        .build()?;

    match args.command {
        Command::Login {
            access_token,
            refresh_token,
        } => {
            client
                .tokens()
                .set_tokens(&access_token, refresh_token.as_deref());
            match TokenClaims::decode(&access_token) {
                Ok(claims) => println!("Stored session, access token valid until {}", expiry(&claims)),
                Err(e) => println!("Stored session (access token unreadable: {e})"),
            }
        }
        Command::Whoami => whoami(&client),
        Command::List { page_size, all } => list(&client, page_size, all).await?,
        Command::Shorten { url, custom_code } => {
            let short = client.shorten(url, custom_code.as_deref()).await?;
            println!("{}", short.link(&client.config().base_url));
        }
        Command::Usage => {
            let usage = client.usage().await?;
            println!("{}", serde_json::to_string_pretty(&usage)?);
        }
        Command::Logout => {
            client.logout().await;
            println!("Logged out");
        }
    }

    Ok(())
}

fn whoami(client: &ApiClient) {
    let tokens = client.tokens();
    let Some(claims) = tokens.claims() else {
        println!("Not logged in");
        return;
    };

    let who = claims
        .name
        .as_deref()
        .or(claims.email.as_deref())
        .or(claims.subject.as_deref())
        .unwrap_or("unknown user");
    let state = if claims.is_expired_at(Utc::now().timestamp()) {
        "expired"
    } else {
        "valid"
    };
    println!("{who}");
    if !claims.roles.is_empty() {
        println!("roles: {}", claims.roles.join(", "));
    }
    println!("access token {state} until {}", expiry(&claims));
    println!(
        "refresh token {}",
        if tokens.refresh_token().is_some() { "stored" } else { "missing" }
    );
}

async fn list(client: &ApiClient, page_size: u32, all: bool) -> anyhow::Result<()> {
    let urls = PagedList::<ShortUrl>::new(page_size);
    loop {
        let loaded = urls
            .load_next(|page, size| client.urls_page(page, size))
            .await?;
        for url in &loaded {
            print_url(url, &client.config().base_url);
        }
        if !all || urls.is_exhausted() {
            break;
        }
    }

    let state = urls.state();
    debug!("Listed {} pages", state.page_index);
    if !state.exhausted {
        println!("(more available, use --all)");
    } else if urls.items().is_empty() {
        println!("No URLs yet");
    }
    Ok(())
}

fn print_url(url: &ShortUrl, base: &str) {
    println!(
        "{:>6}  {:<32}  {:>5}  {}",
        url.id,
        url.link(base),
        url.click_count.unwrap_or_default(),
        url.original_url
    );
}

fn expiry(claims: &TokenClaims) -> String {
    DateTime::<Utc>::from_timestamp(claims.expires_at, 0)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| claims.expires_at.to_string())
}
