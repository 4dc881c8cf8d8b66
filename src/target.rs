//! 配对目标管理 - 已配对的中继目标及其 token 设置
//!
//! 目标对应集线器上的一台已配对设备。配对时生成唯一的 id/name 组合，
//! 基础值被占用后依次追加后缀（`ntfy-me-2`、`Ntfy me 2`…）。
//! CLI 宿主把目标和累加器槽位一起存在用户配置目录下的 JSON 文件里。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// 配对目标的基础 id
const BASE_ID: &str = "ntfy-me";
/// 配对目标的基础显示名
const BASE_NAME: &str = "Ntfy me";

/// 一台已配对的目标设备
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// 目标 id（配对时生成，唯一）
    pub id: String,
    /// 显示名（唯一）
    pub name: String,
    /// 每目标设置
    #[serde(default)]
    pub settings: TargetSettings,
}

/// 每目标设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetSettings {
    /// 可选 bearer token，空串表示不启用鉴权
    #[serde(default)]
    pub token: String,
}

impl Target {
    /// 取 trim 后的 bearer token，空白视为未配置
    pub fn bearer_token(&self) -> Option<&str> {
        let token = self.settings.token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}

/// 存储文件的磁盘格式
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    targets: Vec<Target>,
    /// 累加器槽位（CLI 宿主跨进程保留 build-json 状态）
    #[serde(default)]
    slots: HashMap<String, String>,
}

/// 目标存储
#[derive(Debug)]
pub struct TargetStore {
    path: PathBuf,
    targets: Vec<Target>,
    slots: HashMap<String, String>,
}

impl TargetStore {
    /// 默认存储路径：`<config_dir>/ntfy-me/targets.json`
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Cannot determine config directory")?;
        Ok(base.join("ntfy-me").join("targets.json"))
    }

    /// 从磁盘加载，文件不存在时返回空存储
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let file = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<StoreFile>(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            StoreFile::default()
        };

        Ok(Self {
            path,
            targets: file.targets,
            slots: file.slots,
        })
    }

    /// 写回磁盘（必要时创建父目录）
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = StoreFile {
            targets: self.targets.clone(),
            slots: self.slots.clone(),
        };
        let raw = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// 所有已配对目标
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// 按 id 或显示名查找
    pub fn find(&self, id_or_name: &str) -> Option<&Target> {
        self.targets
            .iter()
            .find(|t| t.id == id_or_name || t.name == id_or_name)
    }

    /// 生成下一个可配对的候选目标（id/name 都保证唯一）
    pub fn pairing_candidate(&self) -> Target {
        let used_ids: Vec<&str> = self.targets.iter().map(|t| t.id.as_str()).collect();
        let used_names: Vec<&str> = self.targets.iter().map(|t| t.name.as_str()).collect();

        Target {
            id: next_unique(BASE_ID, "-", &used_ids),
            name: next_unique(BASE_NAME, " ", &used_names),
            settings: TargetSettings::default(),
        }
    }

    /// 把候选目标加入存储
    pub fn add_target(&mut self, target: Target) {
        info!(id = %target.id, name = %target.name, "Pairing new target");
        self.targets.push(target);
    }

    /// 更新目标的 token 设置
    pub fn set_token(&mut self, id_or_name: &str, token: &str) -> bool {
        match self
            .targets
            .iter_mut()
            .find(|t| t.id == id_or_name || t.name == id_or_name)
        {
            Some(target) => {
                target.settings.token = token.to_string();
                true
            }
            None => false,
        }
    }

    /// 读累加器槽位
    pub fn slots(&self) -> &HashMap<String, String> {
        &self.slots
    }

    /// 整体替换累加器槽位
    pub fn set_slots(&mut self, slots: HashMap<String, String>) {
        self.slots = slots;
    }

    /// 存储文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 基础值未被占用时直接用，否则从 2 开始追加后缀
fn next_unique(base: &str, separator: &str, used: &[&str]) -> String {
    if !used.contains(&base) {
        return base.to_string();
    }

    let mut suffix = 2;
    loop {
        let candidate = format!("{base}{separator}{suffix}");
        if !used.contains(&candidate.as_str()) {
            return candidate;
        }
        suffix += 1;
    }
}
