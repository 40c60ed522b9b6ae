#[cfg(test)]
#[path = "cookie_test.rs"]
mod tests;

use std::fs;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Credential;
use crate::domain::models::CredentialStore;
use crate::domain::models::CredentialStoreName;

const SESSION_ATTRIBUTES: &str = "Path=/; SameSite=None; Secure";
const EXPIRED_AT: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

struct ParsedCookie<'a> {
    name: &'a str,
    value: &'a str,
    expired: bool,
}

/// Parses a single `Set-Cookie` style line: `name=value; Attr=...; Flag`.
fn parse_cookie(line: &str) -> Option<ParsedCookie> {
    let mut parts = line.split(';');
    let (name, value) = parts.next()?.split_once('=')?;

    let mut expired = false;
    for attr in parts {
        let (key, val) = match attr.split_once('=') {
            Some((key, val)) => (key.trim(), val.trim()),
            None => continue,
        };

        if key.eq_ignore_ascii_case("expires") {
            if let Ok(expires) = DateTime::parse_from_rfc2822(val) {
                expired = expires.with_timezone(&Utc) <= Utc::now();
            }
        } else if key.eq_ignore_ascii_case("max-age") {
            if let Ok(max_age) = val.parse::<i64>() {
                expired = max_age <= 0;
            }
        }
    }

    return Some(ParsedCookie {
        name: name.trim(),
        value: value.trim(),
        expired,
    });
}

/// Keeps the API key in a cookie jar file, one `Set-Cookie` style line per
/// cookie. Lines for other cookies are left alone.
pub struct CookieJar {
    pub file_path: PathBuf,
    cookie_name: String,
}

impl CookieJar {
    pub fn new(file_path: PathBuf, cookie_name: &str) -> CookieJar {
        return CookieJar {
            file_path,
            cookie_name: cookie_name.to_string(),
        };
    }

    pub fn from_config() -> Result<CookieJar> {
        let file_path = PathBuf::from(Config::get(ConfigKey::CredentialFile));
        if file_path.as_os_str().is_empty() {
            bail!("No credential file is configured for the cookie credential store");
        }

        return Ok(CookieJar::new(
            file_path,
            &Config::get(ConfigKey::CookieName),
        ));
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        if !self.file_path.exists() {
            return Ok(vec![]);
        }

        let payload = fs::read_to_string(&self.file_path)?;
        let lines = payload
            .lines()
            .map(|line| return line.trim().to_string())
            .filter(|line| return !line.is_empty())
            .collect::<Vec<String>>();

        return Ok(lines);
    }

    fn write_lines(&self, lines: &[String]) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut payload = lines.join("\n");
        payload.push('\n');
        fs::write(&self.file_path, payload)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.file_path, fs::Permissions::from_mode(0o600))?;
        }

        return Ok(());
    }

    fn is_own_cookie(&self, line: &str) -> bool {
        return parse_cookie(line)
            .map(|cookie| return cookie.name == self.cookie_name)
            .unwrap_or(false);
    }

    fn replace_own_cookie(&self, line: String) -> Result<()> {
        let mut lines = self
            .read_lines()?
            .into_iter()
            .filter(|existing| return !self.is_own_cookie(existing))
            .collect::<Vec<String>>();
        lines.push(line);

        return self.write_lines(&lines);
    }
}

impl CredentialStore for CookieJar {
    fn name(&self) -> CredentialStoreName {
        return CredentialStoreName::Cookie;
    }

    fn get(&self) -> Result<Option<Credential>> {
        for line in self.read_lines()? {
            let cookie = match parse_cookie(&line) {
                Some(cookie) => cookie,
                None => continue,
            };
            if cookie.name != self.cookie_name {
                continue;
            }
            if cookie.expired {
                return Ok(None);
            }

            let value = urlencoding::decode(cookie.value)?.into_owned();
            if value.trim().is_empty() {
                return Ok(None);
            }

            return Ok(Some(Credential::new(&value)));
        }

        return Ok(None);
    }

    fn set(&self, credential: &Credential) -> Result<()> {
        let line = format!(
            "{name}={value}; {SESSION_ATTRIBUTES}",
            name = self.cookie_name,
            value = urlencoding::encode(credential.as_str())
        );
        tracing::debug!(path = ?self.file_path, cookie = %self.cookie_name, "Storing credential cookie");

        return self.replace_own_cookie(line);
    }

    fn clear(&self) -> Result<()> {
        let has_cookie = self
            .read_lines()?
            .iter()
            .any(|line| return self.is_own_cookie(line));
        if !has_cookie {
            return Ok(());
        }

        let line = format!(
            "{name}=; {SESSION_ATTRIBUTES}; Expires={EXPIRED_AT}",
            name = self.cookie_name
        );
        tracing::debug!(path = ?self.file_path, cookie = %self.cookie_name, "Expiring credential cookie");

        return self.replace_own_cookie(line);
    }
}
