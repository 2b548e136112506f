//! Image rescaler – shrinks an oversized image so it fits one page.
//!
//! Images are never split. When one is taller than a page, the allocator
//! asks for a uniform downscale against the full budget of the page it lands
//! on, minus a safety margin.

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::dom::{DomNode, ElementNode, Tag};
use crate::style::{inline_property, parse_length, with_properties};

/// Attribute carrying the decoded intrinsic width, set by hosts that already
/// loaded the image.
pub const NATURAL_WIDTH_ATTR: &str = "data-natural-width";
/// Attribute carrying the decoded intrinsic height.
pub const NATURAL_HEIGHT_ATTR: &str = "data-natural-height";

/// Display size of an image. `width` is `None` when it is unknown and left to
/// the browser's aspect-ratio logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: Option<f32>,
    pub height: f32,
}

/// The `<img>` a block stands for: the block itself, or the only element in a
/// chain of wrappers that hold no other content.
pub fn find_image(element: &ElementNode) -> Option<&ElementNode> {
    if element.tag == Tag::Img {
        return Some(element);
    }
    if element
        .children
        .iter()
        .any(|c| matches!(c, DomNode::Text(_)) && !c.is_blank_text())
    {
        return None;
    }
    let mut elements = element.element_children();
    let only = elements.next()?;
    if elements.next().is_some() {
        return None;
    }
    find_image(only)
}

fn find_image_mut(element: &mut ElementNode) -> Option<&mut ElementNode> {
    if element.tag == Tag::Img {
        return Some(element);
    }
    let mut elements = element.children.iter_mut().filter_map(|c| match c {
        DomNode::Element(e) => Some(e),
        DomNode::Text(_) => None,
    });
    let only = elements.next()?;
    if elements.next().is_some() {
        return None;
    }
    find_image_mut(only)
}

/// Decoded pixel size: annotated `data-natural-*` attributes first, then the
/// header of a base64 data-URI source.
pub fn natural_size(img: &ElementNode) -> Option<(f32, f32)> {
    let annotated = img
        .attr(NATURAL_WIDTH_ATTR)
        .and_then(|w| w.trim().parse::<f32>().ok())
        .zip(
            img.attr(NATURAL_HEIGHT_ATTR)
                .and_then(|h| h.trim().parse::<f32>().ok()),
        );
    if let Some((w, h)) = annotated {
        if w > 0.0 && h > 0.0 {
            return Some((w, h));
        }
    }
    decode_data_uri_size(img.src()?)
}

fn decode_data_uri_size(src: &str) -> Option<(f32, f32)> {
    if !src.starts_with("data:") || !src.contains(";base64,") {
        return None;
    }
    let comma = src.find(',')?;
    let bytes = BASE64_STD.decode(src[comma + 1..].trim()).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (w, h) = (img.width() as f32, img.height() as f32);
    if w == 0.0 || h == 0.0 {
        return None;
    }
    Some((w, h))
}

/// Author-specified size from inline style or `width`/`height` attributes.
pub fn declared_size(img: &ElementNode) -> (Option<f32>, Option<f32>) {
    let lookup = |name: &str| {
        img.inline_style()
            .and_then(|s| inline_property(s, name))
            .and_then(|v| parse_length(v, 16.0))
            .or_else(|| img.attr(name).and_then(|v| parse_length(v, 16.0)))
            .filter(|v| *v > 0.0)
    };
    (lookup("width"), lookup("height"))
}

/// Intrinsic size used for rescaling. Falls back from the natural size to the
/// measured block height, then the declared height, then `default_height`.
pub fn intrinsic_size(element: &ElementNode, measured: Option<f32>, default_height: f32) -> ImageSize {
    let Some(img) = find_image(element) else {
        return ImageSize {
            width: None,
            height: measured.unwrap_or(default_height),
        };
    };
    if let Some((w, h)) = natural_size(img) {
        return ImageSize {
            width: Some(w),
            height: h,
        };
    }
    let (width, declared_height) = declared_size(img);
    let height = measured
        .filter(|h| *h > 0.0)
        .or(declared_height)
        .unwrap_or(default_height);
    ImageSize { width, height }
}

/// Size that makes the image fit `budget` minus `margin`, or `None` when the
/// intrinsic size already fits. Images are never scaled up.
pub fn rescale(
    element: &ElementNode,
    measured: Option<f32>,
    budget: f32,
    margin: f32,
    default_height: f32,
) -> Option<ImageSize> {
    let intrinsic = intrinsic_size(element, measured, default_height);
    if intrinsic.height <= 0.0 {
        return None;
    }
    let target = if budget - margin > 0.0 { budget - margin } else { budget };
    let scale = target / intrinsic.height;
    if scale >= 1.0 {
        return None;
    }
    log::debug!(
        "Scaling image from {:.1}px to {:.1}px (factor {scale:.3})",
        intrinsic.height,
        intrinsic.height * scale
    );
    Some(ImageSize {
        width: intrinsic.width.map(|w| w * scale),
        height: intrinsic.height * scale,
    })
}

/// Copy of the block with the image's display size rewritten.
pub fn apply_size(element: &ElementNode, size: &ImageSize) -> ElementNode {
    let mut out = element.clone();
    if let Some(img) = find_image_mut(&mut out) {
        let width = size
            .width
            .map_or_else(|| "auto".to_string(), |w| format!("{w:.2}px"));
        let style = with_properties(
            img.inline_style().unwrap_or(""),
            &[
                ("width", width),
                ("height", format!("{:.2}px", size.height)),
                ("max-height", format!("{:.2}px", size.height)),
            ],
        );
        img.set_attr("style", style);
    }
    out
}
