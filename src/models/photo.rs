use serde::Deserialize;

use crate::error::{RandimgError, Result};

/// Subset of the `/photos/random` response that the downloader uses.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomPhoto {
    pub id: String,
    pub user: PhotoUser,
    pub urls: PhotoUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoUser {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoUrls {
    pub raw: String,
}

impl RandomPhoto {
    /// Raw image URL resized server-side to `width` and encoded as `format`
    pub fn image_url(&self, width: u32, format: &str) -> String {
        let separator = if self.urls.raw.contains('?') { '&' } else { '?' };
        format!("{}{}w={}&fm={}", self.urls.raw, separator, width, format)
    }

    /// `<username>-<id>.<format>`, refused if it could escape the output
    /// directory
    pub fn filename(&self, format: &str) -> Result<String> {
        let name = format!("{}-{}.{}", self.user.username, self.id, format);
        if name.contains(['/', '\\', '\0']) || name.contains("..") {
            return Err(RandimgError::UnsafeFilename(name));
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(raw: &str) -> RandomPhoto {
        serde_json::from_value(serde_json::json!({
            "id": "Dwu85P9SOIk",
            "width": 6000,
            "user": { "id": "QPxL2MGqfrw", "username": "exampleuser" },
            "urls": { "raw": raw, "full": "ignored" }
        }))
        .unwrap()
    }

    #[test]
    fn test_image_url_appends_to_existing_query() {
        let p = photo("https://images.unsplash.com/photo-1?ixid=abc");
        assert_eq!(
            p.image_url(3840, "jpg"),
            "https://images.unsplash.com/photo-1?ixid=abc&w=3840&fm=jpg"
        );
    }

    #[test]
    fn test_image_url_starts_query_when_missing() {
        let p = photo("https://images.unsplash.com/photo-1");
        assert_eq!(
            p.image_url(1920, "png"),
            "https://images.unsplash.com/photo-1?w=1920&fm=png"
        );
    }

    #[test]
    fn test_filename_is_username_dash_id() {
        let p = photo("https://images.unsplash.com/photo-1");
        assert_eq!(p.filename("jpg").unwrap(), "exampleuser-Dwu85P9SOIk.jpg");
    }

    #[test]
    fn test_filename_rejects_path_components() {
        let mut p = photo("https://images.unsplash.com/photo-1");
        for username in ["../../etc", "a/b", "a\\b", ".."] {
            p.user.username = username.to_string();
            let err = p.filename("jpg").unwrap_err();
            assert!(matches!(err, RandimgError::UnsafeFilename(_)), "{username}");
        }

        p.user.username = "ok".to_string();
        p.id = "x/../../y".to_string();
        assert!(p.filename("jpg").is_err());
        assert!(p.filename("../jpg").is_err());
    }
}
