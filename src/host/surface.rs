//! ### English
//! Pixel-format negotiation (hardware accelerated, double buffered, fixed color depth, shader
//! capable profile).
//!
//! The attribute order is part of the contract: drivers pick their fallback based on it, so the
//! encoded list is always accelerated, double-buffer, color-size, profile, terminator.
//!
//! ### 中文
//! 像素格式协商（硬件加速、双缓冲、固定色深、支持着色器的 profile）。
//!
//! 属性顺序属于契约的一部分：驱动会据此选择回退方案，因此编码结果始终为
//! accelerated、double-buffer、color-size、profile、终止符。

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::config::SurfaceConfig;
use super::error::HostError;
use super::platform::Platform;

/// ### English
/// Attribute words understood by the platform pixel-format chooser.
///
/// ### 中文
/// 平台像素格式选择器识别的属性字。
pub mod attribute {
    pub const TERMINATOR: u32 = 0;
    pub const DOUBLE_BUFFER: u32 = 5;
    pub const COLOR_SIZE: u32 = 8;
    pub const ACCELERATED: u32 = 73;
    pub const PROFILE: u32 = 99;

    pub const PROFILE_LEGACY: u32 = 0x1000;
    pub const PROFILE_3_2_CORE: u32 = 0x3200;
    pub const PROFILE_4_1_CORE: u32 = 0x4100;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// ### English
/// Shader profile requested from the platform.
///
/// ### 中文
/// 向平台请求的着色器 profile。
pub enum ProfileVersion {
    #[serde(rename = "legacy")]
    Legacy,
    #[serde(rename = "gl3_2_core")]
    Gl3_2Core,
    #[serde(rename = "gl4_1_core")]
    Gl4_1Core,
}

impl ProfileVersion {
    /// ### English
    /// Platform constant that follows the profile attribute.
    ///
    /// ### 中文
    /// 紧跟在 profile 属性之后的平台常量。
    pub const fn attribute_value(self) -> u32 {
        match self {
            Self::Legacy => attribute::PROFILE_LEGACY,
            Self::Gl3_2Core => attribute::PROFILE_3_2_CORE,
            Self::Gl4_1Core => attribute::PROFILE_4_1_CORE,
        }
    }

    /// ### English
    /// Lowest context version (major, minor) that satisfies this profile.
    ///
    /// ### 中文
    /// 满足该 profile 的最低上下文版本（major, minor）。
    pub const fn min_version(self) -> (u32, u32) {
        match self {
            Self::Legacy => (1, 0),
            Self::Gl3_2Core => (3, 2),
            Self::Gl4_1Core => (4, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// ### English
/// One requested pixel-format attribute.
///
/// ### 中文
/// 单个请求的像素格式属性。
pub enum PixelFormatAttribute {
    Accelerated,
    DoubleBuffer,
    ColorSize(u32),
    Profile(ProfileVersion),
}

impl PixelFormatAttribute {
    fn encode_into(self, words: &mut Vec<u32>) {
        match self {
            Self::Accelerated => words.push(attribute::ACCELERATED),
            Self::DoubleBuffer => words.push(attribute::DOUBLE_BUFFER),
            Self::ColorSize(bits) => words.extend([attribute::COLOR_SIZE, bits]),
            Self::Profile(profile) => {
                words.extend([attribute::PROFILE, profile.attribute_value()])
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// ### English
/// Immutable description of the negotiated format.
///
/// ### 中文
/// 协商所得格式的不可变描述。
pub struct FormatDescriptor {
    pub accelerated: bool,
    pub double_buffer: bool,
    pub color_size: u32,
    pub profile: ProfileVersion,
}

impl FormatDescriptor {
    /// ### English
    /// Whether the request explicitly drops acceleration or double buffering.
    ///
    /// ### 中文
    /// 请求是否显式放弃了硬件加速或双缓冲。
    pub fn is_downgraded(&self) -> bool {
        !self.accelerated || !self.double_buffer
    }
}

/// ### English
/// Builds the attribute request and negotiates it against a platform.
///
/// ### 中文
/// 构建属性请求并与平台进行协商。
#[derive(Debug, Clone)]
pub struct GraphicsSurfaceConfig {
    descriptor: FormatDescriptor,
}

impl From<&SurfaceConfig> for GraphicsSurfaceConfig {
    fn from(config: &SurfaceConfig) -> Self {
        Self {
            descriptor: FormatDescriptor {
                accelerated: config.accelerated,
                double_buffer: config.double_buffer,
                color_size: config.color_size,
                profile: config.profile,
            },
        }
    }
}

impl Default for GraphicsSurfaceConfig {
    fn default() -> Self {
        Self::from(&SurfaceConfig::default())
    }
}

impl GraphicsSurfaceConfig {
    /// ### English
    /// Requested attributes in negotiation order.
    ///
    /// ### 中文
    /// 按协商顺序排列的请求属性。
    pub fn attributes(&self) -> Vec<PixelFormatAttribute> {
        let d = &self.descriptor;
        let mut attributes = Vec::with_capacity(4);
        if d.accelerated {
            attributes.push(PixelFormatAttribute::Accelerated);
        }
        if d.double_buffer {
            attributes.push(PixelFormatAttribute::DoubleBuffer);
        }
        attributes.push(PixelFormatAttribute::ColorSize(d.color_size));
        attributes.push(PixelFormatAttribute::Profile(d.profile));
        attributes
    }

    /// ### English
    /// Zero-terminated attribute words passed to the platform.
    ///
    /// ### 中文
    /// 传给平台的、以 0 结尾的属性字列表。
    pub fn encode(&self) -> Vec<u32> {
        let mut words = Vec::with_capacity(8);
        for attribute in self.attributes() {
            attribute.encode_into(&mut words);
        }
        words.push(attribute::TERMINATOR);
        words
    }

    /// ### English
    /// Asks the platform for a pixel format matching the exact attribute list.
    ///
    /// There is no silent downgrade: if the platform cannot satisfy the request this fails with
    /// `HostError::NoCompatibleFormat`. A request that disables acceleration or double
    /// buffering is logged as an explicit downgrade before negotiating.
    ///
    /// #### Parameters
    /// - `platform`: Backend asked to choose the native pixel format.
    ///
    /// ### 中文
    /// 向平台请求与属性列表完全匹配的像素格式。
    ///
    /// 不会静默降级：平台无法满足时返回 `HostError::NoCompatibleFormat`。关闭硬件加速或双缓冲的
    /// 请求会在协商前作为显式降级记录日志。
    ///
    /// #### 参数
    /// - `platform`：负责选择原生像素格式的后端。
    pub fn negotiate<P: Platform>(&self, platform: &P) -> Result<SurfaceFormat<P>, HostError> {
        let attributes = self.encode();
        if self.descriptor.is_downgraded() {
            warn!(
                accelerated = self.descriptor.accelerated,
                double_buffer = self.descriptor.double_buffer,
                "surface config explicitly downgrades the required pixel format"
            );
        }
        match platform.choose_pixel_format(&attributes) {
            Some(native) => {
                debug!(?attributes, "negotiated pixel format");
                Ok(SurfaceFormat {
                    descriptor: self.descriptor,
                    native,
                })
            }
            None => {
                error!(?attributes, "cannot construct pixel format");
                Err(HostError::NoCompatibleFormat { attributes })
            }
        }
    }
}

/// ### English
/// Negotiated pixel format: the immutable descriptor plus the platform's native object.
///
/// ### 中文
/// 协商所得的像素格式：不可变描述加上平台原生对象。
pub struct SurfaceFormat<P: Platform> {
    descriptor: FormatDescriptor,
    native: P::PixelFormat,
}

impl<P: Platform> SurfaceFormat<P> {
    /// Requested attributes this format satisfies.
    pub fn descriptor(&self) -> &FormatDescriptor {
        &self.descriptor
    }

    /// ### English
    /// Platform-owned pixel format object, released when this value drops.
    ///
    /// ### 中文
    /// 平台持有的像素格式对象，在本值 drop 时释放。
    pub fn native(&self) -> &P::PixelFormat {
        &self.native
    }
}
