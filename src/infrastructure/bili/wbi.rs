// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! WBI 参数签名
//!
//! 密钥由 nav 接口下发的两个图片 URL 派生：取各自文件名主干拼接，
//! 按固定置换表重排后截取前 32 字符得到 mixin key。签名时对参数
//! 值去除 `!'()*`，附加 wts 时间戳，按键名排序编码后与 mixin key
//! 拼接取 MD5 作为 w_rid。

/// mixin key 派生用的固定置换表
const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22,
    25, 54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

/// 从图片 URL 提取密钥片段：最后一个路径段去掉扩展名
fn extract_key(url: &str) -> &str {
    let name = url.rsplit('/').next().unwrap_or("");
    name.split('.').next().unwrap_or("")
}

/// 由两个密钥 URL 派生 mixin key
///
/// 拼接长度不足 64 时视为密钥无效，返回 None（签名降级不可用）。
pub fn mixin_key(img_url: &str, sub_url: &str) -> Option<String> {
    let combined = format!("{}{}", extract_key(img_url.trim()), extract_key(sub_url.trim()));
    let chars: Vec<char> = combined.chars().collect();
    if chars.len() < 64 {
        return None;
    }
    Some(MIXIN_KEY_ENC_TAB.iter().map(|&i| chars[i]).take(32).collect())
}

/// 对参数集签名，返回含 wts 与 w_rid 的完整参数表
pub fn sign_params(params: &[(String, String)], mixin_key: &str, wts: i64) -> Vec<(String, String)> {
    let mut filtered: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            let cleaned: String = v.chars().filter(|c| !"!'()*".contains(*c)).collect();
            (k.clone(), cleaned)
        })
        .collect();
    filtered.push(("wts".to_string(), wts.to_string()));
    filtered.sort_by(|a, b| a.0.cmp(&b.0));

    let query = filtered
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k),
                urlencoding::encode(v)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    let digest = md5::compute(format!("{}{}", query, mixin_key));
    filtered.push(("w_rid".to_string(), format!("{:x}", digest)));
    filtered
}
