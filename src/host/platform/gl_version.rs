/// ### English
/// Parses the (major, minor) pair out of a `GL_VERSION` string.
///
/// Expected forms: `"4.1 Metal - 76.3"`, `"4.6.0 NVIDIA 535.54"` or `"OpenGL ES 3.2 ..."`.
/// Returns `None` when no numeric token is present.
///
/// ### 中文
/// 从 `GL_VERSION` 字符串中解析 (major, minor)。
///
/// 期望的形式：`"4.1 Metal - 76.3"`、`"4.6.0 NVIDIA 535.54"` 或 `"OpenGL ES 3.2 ..."`。
/// 不含数字 token 时返回 `None`。
pub fn parse_gl_version(version: &str) -> Option<(u32, u32)> {
    let token = version.split_whitespace().find(|t| {
        t.chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
    })?;

    let mut parts = token.split('.');
    let major = parts.next().and_then(|s| s.parse::<u32>().ok())?;
    let minor = parts
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0);
    Some((major, minor))
}
