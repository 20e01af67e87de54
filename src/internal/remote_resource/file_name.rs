//! 最终文件名：解析 Content-Disposition，或根据时间戳与 MIME 类型生成。

use chrono::Utc;
use percent_encoding::percent_decode_str;
use tracing::info;

use super::structs::ResourceMetadata;

/// 从 `Content-Disposition` 中提取文件名。
///
/// 同时支持 `filename="a.txt"` 与 RFC 5987 的 `filename*=UTF-8''a%20b.txt`，两者并存时优先后者。
/// 结果只保留最后一段路径，无法得到合法文件名时返回 `None`。
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;

    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                if let Some(name) = decode_ext_value(raw.trim()).and_then(|n| sanitize_file_name(&n)) {
                    return Some(name);
                }
            }
            "filename" if plain.is_none() => {
                plain = sanitize_file_name(&unquote(raw.trim()));
            }
            _ => {}
        }
    }

    plain
}

/// 生成文件名：当前 UTC 纳秒时间戳，能识别 MIME 类型时追加扩展名。
pub fn synthesize_file_name(content_type: Option<&str>) -> String {
    let now = Utc::now();
    let stamp = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp());

    match content_type.and_then(extension_for_content_type) {
        Some(ext) => format!("{stamp}.{ext}"),
        None => stamp.to_string(),
    }
}

/// MIME 类型对应的常用扩展名（不含点），忽略参数部分与大小写。
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let ext = match essence.as_str() {
        "application/octet-stream" => "bin",
        "application/pdf" => "pdf",
        "application/json" => "json",
        "application/xml" | "text/xml" => "xml",
        "application/zip" => "zip",
        "application/gzip" | "application/x-gzip" => "gz",
        "application/x-tar" => "tar",
        "application/x-7z-compressed" => "7z",
        "application/wasm" => "wasm",
        "application/javascript" | "text/javascript" => "js",
        "text/plain" => "txt",
        "text/html" => "html",
        "text/css" => "css",
        "text/csv" => "csv",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        "audio/mpeg" => "mp3",
        "video/mp4" => "mp4",
        _ => return None,
    };
    Some(ext)
}

/// 决定最终文件名：调用方指定 > 服务器建议 > 自动生成。
pub fn resolve_file_name(metadata: &ResourceMetadata, output_name: Option<&str>) -> String {
    if let Some(name) = output_name.and_then(sanitize_file_name) {
        return name;
    }
    if !metadata.name.is_empty() {
        return metadata.name.clone();
    }

    let name = synthesize_file_name(metadata.content_type.as_deref());
    info!(%name, "no file name in Content-Disposition header, using a generated one");
    name
}

/// 只保留最后一段路径并去掉控制字符，避免服务器给出的名字跳出保存目录。
pub(crate) fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();

    match cleaned.trim() {
        "" | "." | ".." => None,
        trimmed => Some(trimmed.to_string()),
    }
}

fn unquote(raw: &str) -> String {
    match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\""),
        None => raw.to_string(),
    }
}

/// `charset'language'percent-encoded`
fn decode_ext_value(raw: &str) -> Option<String> {
    let raw = unquote(raw);
    let mut parts = raw.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    let decoded = percent_decode_str(encoded);
    if charset.eq_ignore_ascii_case("utf-8") {
        decoded.decode_utf8().ok().map(|s| s.into_owned())
    } else {
        Some(decoded.decode_utf8_lossy().into_owned())
    }
}
