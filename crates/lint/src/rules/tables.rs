//! Property tables shared by the declaration rules

use std::sync::LazyLock;

use rustc_hash::{FxHashMap, FxHashSet};

/// Standard property names, plus the IE-only `filter` and `zoom`
pub static KNOWN_PROPERTIES: LazyLock<FxHashSet<&'static str>> = LazyLock::new(|| {
    let names = [
        "alignment-adjust", "alignment-baseline", "animation", "animation-delay",
        "animation-direction", "animation-duration", "animation-iteration-count", "animation-name",
        "animation-play-state", "animation-timing-function", "appearance", "azimuth",
        "backface-visibility", "background", "background-attachment", "background-break",
        "background-clip", "background-color", "background-image", "background-origin",
        "background-position", "background-repeat", "background-size", "baseline-shift", "binding",
        "bleed", "bookmark-label", "bookmark-level", "bookmark-state", "bookmark-target", "border",
        "border-bottom", "border-bottom-color", "border-bottom-left-radius",
        "border-bottom-right-radius", "border-bottom-style", "border-bottom-width",
        "border-collapse", "border-color", "border-image", "border-image-outset",
        "border-image-repeat", "border-image-slice", "border-image-source", "border-image-width",
        "border-left", "border-left-color", "border-left-style", "border-left-width",
        "border-radius", "border-right", "border-right-color", "border-right-style",
        "border-right-width", "border-spacing", "border-style", "border-top", "border-top-color",
        "border-top-left-radius", "border-top-right-radius", "border-top-style", "border-top-width",
        "border-width", "bottom", "box-align", "box-decoration-break", "box-direction", "box-flex",
        "box-flex-group", "box-lines", "box-ordinal-group", "box-orient", "box-pack", "box-shadow",
        "box-sizing", "break-after", "break-before", "break-inside", "caption-side", "clear",
        "clip", "color", "color-profile", "column-count", "column-fill", "column-gap",
        "column-rule", "column-rule-color", "column-rule-style", "column-rule-width", "column-span",
        "column-width", "columns", "content", "counter-increment", "counter-reset", "crop", "cue",
        "cue-after", "cue-before", "cursor", "direction", "display", "dominant-baseline",
        "drop-initial-after-adjust", "drop-initial-after-align", "drop-initial-before-adjust",
        "drop-initial-before-align", "drop-initial-size", "drop-initial-value", "elevation",
        "empty-cells", "fit", "fit-position", "float", "float-offset", "font", "font-family",
        "font-size", "font-size-adjust", "font-stretch", "font-style", "font-variant",
        "font-weight", "grid-columns", "grid-rows", "hanging-punctuation", "height",
        "hyphenate-after", "hyphenate-before", "hyphenate-character", "hyphenate-lines",
        "hyphenate-resource", "hyphens", "icon", "image-orientation", "image-rendering",
        "image-resolution", "inline-box-align", "left", "letter-spacing", "line-height",
        "line-stacking", "line-stacking-ruby", "line-stacking-shift", "line-stacking-strategy",
        "list-style", "list-style-image", "list-style-position", "list-style-type", "margin",
        "margin-bottom", "margin-left", "margin-right", "margin-top", "mark", "mark-after",
        "mark-before", "marks", "marquee-direction", "marquee-play-count", "marquee-speed",
        "marquee-style", "max-height", "max-width", "min-height", "min-width", "move-to",
        "nav-down", "nav-index", "nav-left", "nav-right", "nav-up", "opacity", "orphans", "outline",
        "outline-color", "outline-offset", "outline-style", "outline-width", "overflow",
        "overflow-style", "overflow-x", "overflow-y", "padding", "padding-bottom", "padding-left",
        "padding-right", "padding-top", "page", "page-break-after", "page-break-before",
        "page-break-inside", "page-policy", "pause", "pause-after", "pause-before", "perspective",
        "perspective-origin", "phonemes", "pitch", "pitch-range", "play-during", "position",
        "presentation-level", "punctuation-trim", "quotes", "rendering-intent", "resize", "rest",
        "rest-after", "rest-before", "richness", "right", "rotation", "rotation-point",
        "ruby-align", "ruby-overhang", "ruby-position", "ruby-span", "size", "speak",
        "speak-header", "speak-numeral", "speak-punctuation", "speech-rate", "stress", "string-set",
        "table-layout", "target", "target-name", "target-new", "target-position", "text-align",
        "text-align-last", "text-decoration", "text-emphasis", "text-height", "text-indent",
        "text-justify", "text-outline", "text-shadow", "text-transform", "text-wrap", "top",
        "transform", "transform-origin", "transform-style", "transition", "transition-delay",
        "transition-duration", "transition-property", "transition-timing-function", "unicode-bidi",
        "vertical-align", "visibility", "voice-balance", "voice-duration", "voice-family",
        "voice-pitch", "voice-pitch-range", "voice-rate", "voice-stress", "voice-volume", "volume",
        "white-space", "white-space-collapse", "widows", "width", "word-break", "word-spacing",
        "word-wrap", "z-index", "filter", "zoom",
    ];
    names.into_iter().collect()
});

/// Vendor-prefixed property -> the standard property it stands in for
pub static VENDOR_PROPERTIES: LazyLock<FxHashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = FxHashMap::default();

    m.insert("-moz-border-radius", "border-radius");
    m.insert("-webkit-border-radius", "border-radius");
    m.insert("-webkit-border-top-left-radius", "border-top-left-radius");
    m.insert("-webkit-border-top-right-radius", "border-top-right-radius");
    m.insert("-webkit-border-bottom-left-radius", "border-bottom-left-radius");
    m.insert("-webkit-border-bottom-right-radius", "border-bottom-right-radius");
    m.insert("-moz-border-radius-topleft", "border-top-left-radius");
    m.insert("-moz-border-radius-topright", "border-top-right-radius");
    m.insert("-moz-border-radius-bottomleft", "border-bottom-left-radius");
    m.insert("-moz-border-radius-bottomright", "border-bottom-right-radius");
    m.insert("-moz-box-shadow", "box-shadow");
    m.insert("-webkit-box-shadow", "box-shadow");
    m.insert("-moz-transform", "transform");
    m.insert("-webkit-transform", "transform");
    m.insert("-o-transform", "transform");
    m.insert("-ms-transform", "transform");
    m.insert("-moz-box-sizing", "box-sizing");
    m.insert("-webkit-box-sizing", "box-sizing");
    m.insert("-moz-user-select", "user-select");
    m.insert("-khtml-user-select", "user-select");
    m.insert("-webkit-user-select", "user-select");

    m
});

/// Properties and the vendor prefixes that implement them compatibly
pub static COMPATIBLE_PREFIXES: &[(&str, &[&str])] = &[
    ("animation", &["webkit", "moz"]),
    ("animation-delay", &["webkit", "moz"]),
    ("animation-direction", &["webkit", "moz"]),
    ("animation-duration", &["webkit", "moz"]),
    ("animation-fill-mode", &["webkit", "moz"]),
    ("animation-iteration-count", &["webkit", "moz"]),
    ("animation-name", &["webkit", "moz"]),
    ("animation-play-state", &["webkit", "moz"]),
    ("animation-timing-function", &["webkit", "moz"]),
    ("appearance", &["webkit", "moz"]),
    ("border-end", &["webkit", "moz"]),
    ("border-end-color", &["webkit", "moz"]),
    ("border-end-style", &["webkit", "moz"]),
    ("border-end-width", &["webkit", "moz"]),
    ("border-image", &["webkit", "moz", "o"]),
    ("border-radius", &["webkit", "moz"]),
    ("border-start", &["webkit", "moz"]),
    ("border-start-color", &["webkit", "moz"]),
    ("border-start-style", &["webkit", "moz"]),
    ("border-start-width", &["webkit", "moz"]),
    ("box-align", &["webkit", "moz", "ms"]),
    ("box-direction", &["webkit", "moz", "ms"]),
    ("box-flex", &["webkit", "moz", "ms"]),
    ("box-lines", &["webkit", "ms"]),
    ("box-ordinal-group", &["webkit", "moz", "ms"]),
    ("box-orient", &["webkit", "moz", "ms"]),
    ("box-pack", &["webkit", "moz", "ms"]),
    ("box-sizing", &["webkit", "moz"]),
    ("box-shadow", &["webkit", "moz"]),
    ("column-count", &["webkit", "moz"]),
    ("column-gap", &["webkit", "moz"]),
    ("column-rule", &["webkit", "moz"]),
    ("column-rule-color", &["webkit", "moz"]),
    ("column-rule-style", &["webkit", "moz"]),
    ("column-rule-width", &["webkit", "moz"]),
    ("column-width", &["webkit", "moz"]),
    ("hyphens", &["epub", "moz"]),
    ("line-break", &["webkit", "ms"]),
    ("margin-end", &["webkit", "moz"]),
    ("margin-start", &["webkit", "moz"]),
    ("marquee-speed", &["webkit", "wap"]),
    ("marquee-style", &["webkit", "wap"]),
    ("padding-end", &["webkit", "moz"]),
    ("padding-start", &["webkit", "moz"]),
    ("tab-size", &["moz", "o"]),
    ("text-size-adjust", &["webkit", "ms"]),
    ("transform", &["webkit", "moz", "ms", "o"]),
    ("transform-origin", &["webkit", "moz", "ms", "o"]),
    ("transition", &["webkit", "moz", "o"]),
    ("transition-delay", &["webkit", "moz", "o"]),
    ("transition-duration", &["webkit", "moz", "o"]),
    ("transition-property", &["webkit", "moz", "o"]),
    ("transition-timing-function", &["webkit", "moz", "o"]),
    ("user-modify", &["webkit", "moz"]),
    ("user-select", &["webkit", "moz"]),
    ("word-break", &["epub", "ms"]),
    ("writing-mode", &["epub", "ms"]),
];

/// Every prefixed variant in [`COMPATIBLE_PREFIXES`] -> index of its entry
pub static COMPATIBLE_VARIANTS: LazyLock<FxHashMap<String, usize>> = LazyLock::new(|| {
    let mut m = FxHashMap::default();
    for (index, (property, prefixes)) in COMPATIBLE_PREFIXES.iter().enumerate() {
        for prefix in prefixes.iter() {
            m.insert(format!("-{}-{}", prefix, property), index);
        }
    }
    m
});
