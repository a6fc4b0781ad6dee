//! 结果展平 - 业务能力层
//!
//! 把嵌套的映射结构折叠成单层映射，键为点号连接的路径。
//! 只有映射会被展开，数组、null 等值原样保留。

use crate::models::FlatRecord;
use serde_json::{Map, Value as JsonValue};

/// 默认分隔符
pub const DEFAULT_SEPARATOR: &str = ".";

/// 使用默认分隔符展平
pub fn flatten(nested: &Map<String, JsonValue>) -> FlatRecord {
    flatten_with(nested, "", DEFAULT_SEPARATOR)
}

/// 展平嵌套映射
///
/// # 参数
/// - `nested`: 嵌套映射
/// - `prefix`: 键前缀，为空时直接使用键名
/// - `separator`: 路径分隔符
pub fn flatten_with(nested: &Map<String, JsonValue>, prefix: &str, separator: &str) -> FlatRecord {
    let mut flat = FlatRecord::new();
    flatten_into(&mut flat, nested, prefix, separator);
    flat
}

/// 把任意结果值展平；非映射的结果整体放在 `Result` 列
pub fn flatten_value(value: JsonValue) -> FlatRecord {
    match value {
        JsonValue::Object(map) => flatten(&map),
        other => {
            let mut flat = FlatRecord::new();
            flat.insert("Result".to_string(), other);
            flat
        }
    }
}

fn flatten_into(
    flat: &mut FlatRecord,
    nested: &Map<String, JsonValue>,
    prefix: &str,
    separator: &str,
) {
    for (key, value) in nested {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, separator, key)
        };

        match value {
            JsonValue::Object(child) => flatten_into(flat, child, &path, separator),
            leaf => {
                flat.insert(path, leaf.clone());
            }
        }
    }
}
