//! # 配置模块
//!
//! ## 设计思路
//!
//! 所有可调参数集中在 `StylizerConfig`，服务端与客户端各占一节。
//! `Default` 提供开箱即用的本机配置（服务监听 `0.0.0.0:5000`，
//! 客户端访问 `http://localhost:5000`）。
//!
//! ## 实现思路
//!
//! - 配置文件为 JSON，由环境变量 `STYLIZER_CONFIG` 指定；缺省字段回退默认值。
//! - `STYLIZER_BIND` / `STYLIZER_SERVICE_URL` 覆盖文件中的对应字段。
//! - `validate` 做范围校验，错误统一为 `ConfigError::Invalid`。

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "STYLIZER_CONFIG";
pub const BIND_ENV: &str = "STYLIZER_BIND";
pub const SERVICE_URL_ENV: &str = "STYLIZER_SERVICE_URL";

/// 配置加载与校验错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("读取配置文件 '{path}' 失败：{source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析配置文件失败：{0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置无效：{0}")]
    Invalid(String),
}

/// 完整配置。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StylizerConfig {
    pub server: ServiceConfig,
    pub client: ClientConfig,
}

/// 风格化服务配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// 监听地址。
    pub bind_addr: String,
    /// 暂存目录。
    pub staging_dir: PathBuf,
    /// 暂存文件名（不含扩展名）。每个服务实例固定使用同一个路径。
    pub staging_stem: String,
    /// 单次上传允许的最大请求体（字节）。
    pub max_upload_bytes: usize,
    /// 输入图片像素上限（`width * height`），按图片头信息判断。
    pub max_input_pixels: u64,
    /// 内置卡通化效果参数。
    pub cartoon: CartoonConfig,
    /// 外部模型命令；设置后替代内置效果。
    pub external: Option<ExternalCommandConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            staging_dir: std::env::temp_dir().join("portrait-stylizer"),
            staging_stem: "temp_input".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
            max_input_pixels: 40_000_000,
            cartoon: CartoonConfig::default(),
            external: None,
        }
    }
}

/// 内置卡通化效果参数。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CartoonConfig {
    /// 每个颜色通道保留的色阶数。
    pub levels: u8,
    /// 亮度梯度超过该值的像素按描边处理。
    pub edge_threshold: u8,
    /// 处理前宽/高单边最大值，超过则等比降采样。
    pub max_dimension: u32,
}

impl Default for CartoonConfig {
    fn default() -> Self {
        Self {
            levels: 6,
            edge_threshold: 48,
            max_dimension: 2048,
        }
    }
}

/// 外部模型命令：`program args... <input> <output>`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalCommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// 客户端配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 服务根地址，请求发往 `service_url + "/process"`。
    pub service_url: String,
    /// 建立连接超时（秒）。请求整体不设超时。
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5000".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// 处理接口完整地址。
    pub fn process_endpoint(&self) -> String {
        format!("{}/process", self.service_url.trim_end_matches('/'))
    }
}

impl ServiceConfig {
    pub fn bind_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr.parse().map_err(|e| {
            ConfigError::Invalid(format!("bind_addr '{}' 无法解析：{}", self.bind_addr, e))
        })
    }
}

impl StylizerConfig {
    /// 按环境变量加载配置：文件（可选）→ 环境变量覆盖 → 校验。
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 用环境变量覆盖监听地址与服务地址。
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.trim().is_empty()) {
            self.server.bind_addr = bind.trim().to_string();
        }
        if let Some(url) = lookup(SERVICE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.client.service_url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        server.bind_socket_addr()?;

        if server.staging_stem.trim().is_empty()
            || server.staging_stem.contains(['/', '\\'])
        {
            return Err(ConfigError::Invalid(
                "staging_stem 不能为空且不能包含路径分隔符".to_string(),
            ));
        }
        if server.max_upload_bytes < 1024 {
            return Err(ConfigError::Invalid("max_upload_bytes 不能小于 1KB".to_string()));
        }
        if server.max_input_pixels == 0 {
            return Err(ConfigError::Invalid("max_input_pixels 必须大于 0".to_string()));
        }
        if !(2..=64).contains(&server.cartoon.levels) {
            return Err(ConfigError::Invalid("cartoon.levels 必须在 2~64 之间".to_string()));
        }
        if !(16..=16_384).contains(&server.cartoon.max_dimension) {
            return Err(ConfigError::Invalid(
                "cartoon.max_dimension 必须在 16~16384 之间".to_string(),
            ));
        }
        if let Some(external) = &server.external {
            if external.program.trim().is_empty() {
                return Err(ConfigError::Invalid("external.program 不能为空".to_string()));
            }
        }

        let client = &self.client;
        let url = &client.service_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "service_url 必须以 http:// 或 https:// 开头：{}",
                client.service_url
            )));
        }
        if !(1..=120).contains(&client.connect_timeout_secs) {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs 必须在 1~120 秒之间".to_string(),
            ));
        }

        Ok(())
    }
}
