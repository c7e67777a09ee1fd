// src/ingest/classify.rs
//! Keyword classifier: `(name, description) -> (category, tag)`.
//!
//! Rules are tested in order against the lower-cased `name + description`;
//! the first group with any keyword hit wins. No weighting, no multi-label.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Write,
    Image,
    AudioVideo,
    Code,
    Other,
    #[default]
    Uncategorized,
}

impl Category {
    pub fn slug(self) -> &'static str {
        match self {
            Category::Write => "write",
            Category::Image => "image",
            Category::AudioVideo => "audio-video",
            Category::Code => "code",
            Category::Other => "other",
            Category::Uncategorized => "uncategorized",
        }
    }

    /// Group label shown by the listing (stored as `sub_category`).
    pub fn label(self) -> &'static str {
        match self {
            Category::Write => "Writing",
            Category::Image => "Image",
            Category::AudioVideo => "Audio & Video",
            Category::Code => "Code",
            Category::Other => "Other",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Unknown slugs map to the sentinel instead of failing the row.
    pub fn from_slug(s: &str) -> Self {
        match s {
            "write" => Category::Write,
            "image" => Category::Image,
            "audio-video" => Category::AudioVideo,
            "code" => Category::Code,
            "other" => Category::Other,
            _ => Category::Uncategorized,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub tag: &'static str,
}

struct KeywordRule {
    category: Category,
    tag: &'static str,
    keywords: &'static [&'static str],
}

pub const FALLBACK_TAG: &str = "AI Tools";

// Order matters: earlier groups win regardless of how specific a later hit is.
const RULES: &[KeywordRule] = &[
    KeywordRule {
        category: Category::Write,
        tag: "AI Writing",
        keywords: &[
            "write", "writing", "writer", "text", "copywrit", "blog", "article", "essay",
            "写作", "文案", "文本", "小说", "写",
        ],
    },
    KeywordRule {
        category: Category::Image,
        tag: "AI Image",
        keywords: &[
            "image", "photo", "picture", "illustration", "drawing", "avatar", "logo design",
            "图片", "图像", "照片", "绘画", "画",
        ],
    },
    KeywordRule {
        category: Category::AudioVideo,
        tag: "AI Audio & Video",
        keywords: &[
            "video", "audio", "voice", "music", "speech", "podcast", "sound",
            "视频", "音频", "语音", "音乐", "配音",
        ],
    },
    KeywordRule {
        category: Category::Code,
        tag: "AI Coding",
        keywords: &[
            "code", "coding", "developer", "programming", "dev", "api", "sql",
            "代码", "编程", "开发",
        ],
    },
];

pub fn classify(name: &str, description: &str) -> Classification {
    let haystack = format!("{name} {description}").to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| haystack.contains(k)))
        .map(|rule| Classification {
            category: rule.category,
            tag: rule.tag,
        })
        .unwrap_or(Classification {
            category: Category::Other,
            tag: FALLBACK_TAG,
        })
}
