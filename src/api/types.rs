use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Game {
    pub id: i32,
    pub title: String,
    pub system: String,
    pub file_path: String,
    pub emulator_id: String,
    pub emulator_type: String,
    pub added_at: NaiveDateTime,
    #[serde(default)]
    pub user_id: Option<i32>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// 目录列表返回的完整条目：游戏记录 + 关联的模拟器 + 启动地址
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameEntry {
    #[serde(flatten)]
    pub game: Game,
    pub emulator: EmulatorInfo,
    pub launch_url: String,
}

/// 模拟器信息
///
/// emulator_type 在服务端是枚举，这里保留字符串，新增类型不会导致解析失败
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmulatorInfo {
    pub id: String,
    pub name: String,
    pub system: String,
    pub core: String,
    pub supported_formats: Vec<String>,
    pub emulator_type: String,
    #[serde(default)]
    pub service_port: Option<u16>,
    pub github_url: String,
    pub license: String,
}

/// 上传目标主机（目录）及其支持的文件后缀
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleInfo {
    pub id: String,
    pub name: String,
    pub supported_formats: Vec<String>,
}

/// 服务端目录扫描的汇总结果
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScanResult {
    pub total_found: u32,
    pub newly_added: u32,
    pub already_exists: u32,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub game_id: Option<i32>,
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGame {
    pub title: String,
    pub system: String,
    pub file_path: String,
    pub emulator_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionRequest {
    pub username: String,
}

/// 在线用户，服务端每次全量返回
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectedUser {
    pub username: String,
    pub ip_address: String,
    pub last_seen: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectedUsersResponse {
    pub users: Vec<ConnectedUser>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreviousUsernamesResponse {
    pub usernames: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteAccountRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}
