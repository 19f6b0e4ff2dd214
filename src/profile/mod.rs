//! Profile cosmetics exposed on user and profile payloads.
//!
//! Covers avatar decorations, nameplates, profile effects, and guild tags.
//! These are plain accessors over already-fetched JSON; nothing here talks
//! to the network.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

static CDN_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("https://cdn.discordapp.com/").expect("invalid cdn base url"));

const MIN_IMAGE_SIZE: u32 = 16;
const MAX_IMAGE_SIZE: u32 = 4096;

fn timestamp(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn expired(expires_at: Option<i64>, now: DateTime<Utc>) -> bool {
    timestamp(expires_at).is_some_and(|at| at <= now)
}

fn check_size(size: u32) -> Result<u32, ProfileError> {
    if size.is_power_of_two() && (MIN_IMAGE_SIZE..=MAX_IMAGE_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(ProfileError::InvalidSize(size))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarDecoration {
    pub asset: String,
    #[serde(default)]
    pub sku_id: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl AvatarDecoration {
    pub fn url(&self, size: u32) -> Result<Url, ProfileError> {
        let size = check_size(size)?;
        let mut url = CDN_BASE.join(&format!("avatar-decoration-presets/{}.png", self.asset))?;
        url.query_pairs_mut()
            .append_pair("size", &size.to_string())
            .append_pair("passthrough", "true");
        Ok(url)
    }

    pub fn is_animated(&self) -> bool {
        self.asset.starts_with("a_")
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.expires_at)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        expired(self.expires_at, now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nameplate {
    /// Asset directory such as `nameplates/nameplates/twilight/`.
    pub asset: String,
    #[serde(default)]
    pub sku_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub palette: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl Nameplate {
    pub fn static_url(&self) -> Result<Url, ProfileError> {
        self.asset_url("static.png")
    }

    pub fn animated_url(&self) -> Result<Url, ProfileError> {
        self.asset_url("asset.webm")
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.expires_at)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        expired(self.expires_at, now)
    }

    fn asset_url(&self, file: &str) -> Result<Url, ProfileError> {
        let dir = self.asset.trim_start_matches('/');
        let separator = if dir.ends_with('/') { "" } else { "/" };
        Ok(CDN_BASE.join(&format!("assets/collectibles/{dir}{separator}{file}"))?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEffect {
    pub id: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl ProfileEffect {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.expires_at)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        expired(self.expires_at, now)
    }
}

/// The guild tag a user has chosen to display next to their name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryGuild {
    #[serde(default)]
    pub identity_guild_id: Option<String>,
    #[serde(default)]
    pub identity_enabled: Option<bool>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
}

impl PrimaryGuild {
    /// The tag, only while the user has it enabled.
    pub fn display_tag(&self) -> Option<&str> {
        if self.identity_enabled.unwrap_or(false) {
            self.tag.as_deref()
        } else {
            None
        }
    }

    pub fn badge_url(&self, size: u32) -> Result<Url, ProfileError> {
        let size = check_size(size)?;
        let guild_id = self
            .identity_guild_id
            .as_deref()
            .ok_or(ProfileError::MissingField("identity_guild_id"))?;
        let badge = self
            .badge
            .as_deref()
            .ok_or(ProfileError::MissingField("badge"))?;
        let mut url = CDN_BASE.join(&format!("guild-tag-badges/{guild_id}/{badge}.png"))?;
        url.query_pairs_mut().append_pair("size", &size.to_string());
        Ok(url)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Collectibles {
    #[serde(default)]
    nameplate: Option<Nameplate>,
}

#[derive(Debug, Default, Deserialize)]
struct UserPayload {
    #[serde(default)]
    avatar_decoration_data: Option<AvatarDecoration>,
    #[serde(default)]
    collectibles: Option<Collectibles>,
    #[serde(default)]
    primary_guild: Option<PrimaryGuild>,
}

#[derive(Debug, Default, Deserialize)]
struct UserProfilePayload {
    #[serde(default)]
    profile_effect: Option<ProfileEffect>,
}

#[derive(Debug, Deserialize)]
struct ProfilePayload {
    user: UserPayload,
    #[serde(default)]
    user_profile: Option<UserProfilePayload>,
}

/// Every cosmetic found on a user object or a full profile response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileCosmetics {
    avatar_decoration: Option<AvatarDecoration>,
    nameplate: Option<Nameplate>,
    profile_effect: Option<ProfileEffect>,
    guild_tag: Option<PrimaryGuild>,
}

impl ProfileCosmetics {
    /// Accepts either a bare user object or a profile response with `user`
    /// and `user_profile` keys.
    pub fn from_json(value: &Value) -> Result<Self, ProfileError> {
        if value.get("user").is_some_and(Value::is_object) {
            let payload = ProfilePayload::deserialize(value)?;
            let effect = payload.user_profile.and_then(|profile| profile.profile_effect);
            Ok(Self::from_user(payload.user, effect))
        } else {
            let user = UserPayload::deserialize(value)?;
            Ok(Self::from_user(user, None))
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ProfileError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json(&value)
    }

    fn from_user(user: UserPayload, profile_effect: Option<ProfileEffect>) -> Self {
        Self {
            avatar_decoration: user.avatar_decoration_data,
            nameplate: user.collectibles.and_then(|c| c.nameplate),
            profile_effect,
            guild_tag: user.primary_guild,
        }
    }

    pub fn avatar_decoration(&self) -> Option<&AvatarDecoration> {
        self.avatar_decoration.as_ref()
    }

    pub fn nameplate(&self) -> Option<&Nameplate> {
        self.nameplate.as_ref()
    }

    pub fn profile_effect(&self) -> Option<&ProfileEffect> {
        self.profile_effect.as_ref()
    }

    pub fn guild_tag(&self) -> Option<&PrimaryGuild> {
        self.guild_tag.as_ref()
    }

    pub fn has_any(&self) -> bool {
        self.avatar_decoration.is_some()
            || self.nameplate.is_some()
            || self.profile_effect.is_some()
            || self.guild_tag.is_some()
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("image size {0} must be a power of two between 16 and 4096")]
    InvalidSize(u32),
    #[error("cosmetic is missing '{0}'")]
    MissingField(&'static str),
    #[error("failed to build cdn url: {0}")]
    Url(#[from] url::ParseError),
    #[error("malformed profile payload: {0}")]
    Json(#[from] serde_json::Error),
}
