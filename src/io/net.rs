use crate::{
    config::Config,
    error::{RemixError, Result},
    io::progress::emit_download_progress,
};
use reqwest::blocking::{Client, Response};
use std::{
    fs,
    fs::File,
    io::{Read, Write},
    path::Path,
    time::Duration,
};

const USER_AGENT: &str = concat!("phantom-trax/", env!("CARGO_PKG_VERSION"));

/// Blocking client for the hosted API. Only connecting is bounded by
/// default; the overall timeout comes from configuration.
pub fn http_client(config: &Config) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10));
    builder = match config.request_timeout {
        Some(t) => builder.timeout(t),
        None => builder.timeout(None::<Duration>),
    };
    Ok(builder.build()?)
}

/// Turns a non-2xx response into [`RemixError::Api`] carrying the body text.
pub fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(RemixError::Api {
        status: status.as_u16(),
        body,
    })
}

pub fn download_with_progress(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let tmp = dest.with_extension("part");

    let mut resp = check_status(client.get(url).send()?)?;

    let total = resp.content_length().unwrap_or(0);

    emit_download_progress(0, total);

    let mut file = File::create(&tmp)?;
    let mut downloaded: u64 = 0;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = resp.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        downloaded += n as u64;
        emit_download_progress(downloaded, total);
    }
    file.flush()?;

    if dest.exists() {
        fs::remove_file(dest).ok();
    }

    fs::rename(&tmp, dest)?;

    emit_download_progress(total.max(downloaded), total.max(downloaded));

    Ok(())
}
