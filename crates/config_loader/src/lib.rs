//! # Config Loader
//!
//! 层级配置加载：读取 TOML / JSON，反序列化为 [`HierarchyBlueprint`]，
//! 再执行字段级与结构级校验。校验通过的蓝图可以直接交给
//! `param_sync::HostBuilder`。
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("hierarchy.toml")).unwrap();
//! println!("{} nodes, {} edges", blueprint.nodes.len(), blueprint.edges.len());
//! ```

mod parser;
mod validator;

pub use contracts::HierarchyBlueprint;
pub use parser::ConfigFormat;

use std::path::Path;

use contracts::ContractError;

/// Entry point for loading hierarchy blueprints
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, parse and validate a blueprint file; format follows the extension.
    ///
    /// # Errors
    /// `ConfigParse` for unknown extensions or malformed content,
    /// `Io` if the file cannot be read, `ConfigValidation` for semantic errors
    pub fn load_from_path(path: &Path) -> Result<HierarchyBlueprint, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Parse and validate in-memory content
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<HierarchyBlueprint, ContractError> {
        let blueprint = format.parse(content)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    pub fn to_toml(blueprint: &HierarchyBlueprint) -> Result<String, ContractError> {
        ConfigFormat::Toml.render(blueprint)
    }

    pub fn to_json(blueprint: &HierarchyBlueprint) -> Result<String, ContractError> {
        ConfigFormat::Json.render(blueprint)
    }
}
