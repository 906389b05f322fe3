//! 上传时的 Content-Type 与 Cache-Control 策略

use crate::storage::WriteOptions;
use std::path::Path;

pub const CACHE_NO_CACHE: &str = "public, max-age=0, must-revalidate";
pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
pub const CACHE_DEFAULT: &str = "public, max-age=3600";

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// 一年不变的二进制资源
const IMMUTABLE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg", "wav", "mp3", "ogg"];

fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// 根据扩展名选择缓存策略
pub fn cache_control_for(path: &str) -> &'static str {
    let ext = extension(path);
    if ext == "json" {
        CACHE_NO_CACHE
    } else if IMMUTABLE_EXTENSIONS.contains(&ext.as_str()) {
        CACHE_IMMUTABLE
    } else {
        CACHE_DEFAULT
    }
}

/// 根据扩展名推断 MIME 类型
pub fn content_type_for(path: &str) -> &'static str {
    match extension(path).as_str() {
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "js" | "mjs" => "text/javascript",
        "css" => "text/css",
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}

/// 静态资源的写入头
pub fn static_options(path: &str) -> WriteOptions {
    WriteOptions {
        content_type: Some(content_type_for(path).to_string()),
        cache_control: Some(cache_control_for(path).to_string()),
    }
}

/// 配置文件（JSON）的写入头，总是不缓存
pub fn config_options() -> WriteOptions {
    WriteOptions {
        content_type: Some(JSON_CONTENT_TYPE.to_string()),
        cache_control: Some(CACHE_NO_CACHE.to_string()),
    }
}
