// tests/classify_rules.rs
use ai_geek_toolbox::ingest::classify::{classify, Category, FALLBACK_TAG};

#[test]
fn each_rule_group_is_reachable() {
    let cases = [
        ("Jasper", "AI copywriting for marketing teams", Category::Write, "AI Writing"),
        ("Leonardo", "Create game assets and illustration", Category::Image, "AI Image"),
        ("Suno", "Make a song with AI music", Category::AudioVideo, "AI Audio & Video"),
        ("Cursor", "The AI code editor", Category::Code, "AI Coding"),
    ];
    for (name, desc, category, tag) in cases {
        let c = classify(name, desc);
        assert_eq!(c.category, category, "{name}");
        assert_eq!(c.tag, tag, "{name}");
    }
}

#[test]
fn blog_writer_is_write() {
    assert_eq!(classify("Write a blog", "AI text generator").category, Category::Write);
}

#[test]
fn chinese_keywords_classify() {
    assert_eq!(classify("秘塔写作猫", "").category, Category::Write);
    assert_eq!(classify("文心一格", "AI 绘画 平台").category, Category::Image);
    assert_eq!(classify("剪映", "智能 视频 剪辑").category, Category::AudioVideo);
    assert_eq!(classify("通义灵码", "智能 编程 助手").category, Category::Code);
}

#[test]
fn matching_is_case_insensitive_and_spans_name_and_description() {
    assert_eq!(classify("VIDEO Maker", "").category, Category::AudioVideo);
    assert_eq!(classify("Runway", "gen-3 VIDEO model").category, Category::AudioVideo);
}

#[test]
fn write_outranks_everything_listed_after_it() {
    // "text" hits write, "video" hits audio/video
    assert_eq!(classify("Sora", "text to video").category, Category::Write);
    // "image" hits image, "code" hits code
    assert_eq!(classify("Screenshot to Code", "turn an image into html").category, Category::Image);
}

#[test]
fn no_keyword_falls_back_to_other() {
    let c = classify("Perplexity", "answer engine for research");
    assert_eq!(c.category, Category::Other);
    assert_eq!(c.tag, FALLBACK_TAG);
}

#[test]
fn category_slugs_round_trip_and_unknown_is_uncategorized() {
    for c in [
        Category::Write,
        Category::Image,
        Category::AudioVideo,
        Category::Code,
        Category::Other,
    ] {
        assert_eq!(Category::from_slug(c.slug()), c);
    }
    assert_eq!(Category::from_slug("chat"), Category::Uncategorized);
    assert_eq!(Category::default(), Category::Uncategorized);
}
