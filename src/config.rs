use std::fs;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 默认后端地址
pub const DEFAULT_BASE_URL: &str = "http://localhost:37291";
/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "cabinet.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 界面主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

/// 应用配置
///
/// 启动时读取一次，传引用给使用方；所有修改都走 setter，setter 同时负责写盘
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 后端地址，所有 API 调用的 base URL
    pub base_url: String,

    /// 目录接口使用的占位 bearer token
    pub api_token: String,

    /// 主题
    pub theme: Theme,

    /// 上次登录的用户名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_username: Option<String>,

    #[serde(skip)]
    path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: "demo-token".to_string(),
            theme: Theme::Dark,
            last_username: None,
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }
}

impl AppConfig {
    /// 从文件加载；文件不存在时返回默认配置（首次写盘时才会创建文件）
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            let mut config = Self::default();
            config.path = path;
            return Ok(config);
        }

        let data = fs::read_to_string(&path)?;
        let mut config: AppConfig = toml::from_str(&data)?;
        config.path = path;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let data = toml::to_string_pretty(self)?;
        fs::write(&self.path, data)?;

        Ok(())
    }

    /// 修改主题并立即写盘
    pub fn set_theme(&mut self, theme: Theme) -> Result<(), ConfigError> {
        self.theme = theme;
        self.save()
    }

    /// 记住最近一次登录的用户名
    pub fn set_last_username(&mut self, username: Option<String>) -> Result<(), ConfigError> {
        self.last_username = username;
        self.save()
    }
}
