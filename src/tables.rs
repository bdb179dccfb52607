//! Keyword and phrase tables shared by the analysis and prompt engines.

use crate::types::{ImageType, Quality, Style};

/// A weighted keyword cluster used to decide whether text wants an image.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub keywords: &'static [&'static str],
    pub weight: f64,
    pub phrase: &'static str,
}

/// A topic cluster used when no bilingual keyword matched a context.
#[derive(Debug, Clone, Copy)]
pub struct TopicRule {
    pub patterns: &'static [&'static str],
    pub phrase: &'static str,
}

pub const GENERIC_SCORE_PHRASE: &str = "professional illustration, clean modern design";
pub const GENERIC_INTERFACE_PHRASE: &str =
    "modern user interface, clean design, professional layout";
pub const ALT_PROMPT_SUFFIX: &str = "professional illustration, high quality";
pub const CLOSING_PHRASE: &str = "clean composition, good lighting";
pub const OPTIMIZE_QUALITY_PHRASE: &str = "high quality";
pub const OPTIMIZE_COMPOSITION_PHRASE: &str = "well composed";

/// Source markers that flag an existing `<img>` as a stand-in.
pub const PLACEHOLDER_SRC_MARKERS: &[&str] = &["placeholder", "example.com", "via.placeholder"];

pub const IMAGE_CATEGORIES: &[Category] = &[
    // products and features
    Category {
        keywords: &["产品", "功能", "特性", "优势", "服务"],
        weight: 0.8,
        phrase: "modern product showcase, clean design",
    },
    Category {
        keywords: &["界面", "UI", "设计", "页面", "布局"],
        weight: 0.9,
        phrase: "clean user interface design, modern web layout",
    },
    Category {
        keywords: &["流程", "步骤", "方法", "过程"],
        weight: 0.7,
        phrase: "step-by-step process illustration, infographic style",
    },
    // technology and concepts
    Category {
        keywords: &["技术", "算法", "架构", "系统"],
        weight: 0.6,
        phrase: "technical diagram, system architecture visualization",
    },
    Category {
        keywords: &["数据", "统计", "图表", "分析"],
        weight: 0.8,
        phrase: "data visualization, clean charts and graphs",
    },
    Category {
        keywords: &["概念", "原理", "理论"],
        weight: 0.5,
        phrase: "conceptual illustration, educational diagram",
    },
    // business scenes
    Category {
        keywords: &["团队", "合作", "协作", "沟通"],
        weight: 0.7,
        phrase: "professional team collaboration, modern office",
    },
    Category {
        keywords: &["成功", "增长", "提升", "优化"],
        weight: 0.6,
        phrase: "success and growth visualization, upward trend",
    },
    Category {
        keywords: &["解决方案", "解决", "问题"],
        weight: 0.7,
        phrase: "problem solving illustration, solution concept",
    },
    // industries
    Category {
        keywords: &["金融", "投资", "财务"],
        weight: 0.6,
        phrase: "financial growth, modern banking concept",
    },
    Category {
        keywords: &["教育", "学习", "培训"],
        weight: 0.7,
        phrase: "education and learning environment, modern classroom",
    },
    Category {
        keywords: &["医疗", "健康", "治疗"],
        weight: 0.6,
        phrase: "healthcare and medical concept, modern hospital",
    },
    Category {
        keywords: &["科技", "创新", "未来"],
        weight: 0.8,
        phrase: "technology innovation, futuristic design",
    },
];

/// Chinese term to English term, scanned in order.
pub const KEYWORD_MAP: &[(&str, &str)] = &[
    ("网站", "website"),
    ("网页", "webpage"),
    ("界面", "user interface"),
    ("设计", "design"),
    ("产品", "product"),
    ("服务", "service"),
    ("功能", "feature"),
    ("应用", "application"),
    ("系统", "system"),
    ("平台", "platform"),
    ("商务", "business"),
    ("办公", "office"),
    ("会议", "meeting"),
    ("团队", "team"),
    ("合作", "collaboration"),
    ("沟通", "communication"),
    ("管理", "management"),
    ("销售", "sales"),
    ("营销", "marketing"),
    ("客户", "customer"),
    ("开发", "development"),
    ("编程", "programming"),
    ("代码", "code"),
    ("数据", "data"),
    ("分析", "analysis"),
    ("算法", "algorithm"),
    ("人工智能", "artificial intelligence"),
    ("机器学习", "machine learning"),
    ("云计算", "cloud computing"),
    ("区块链", "blockchain"),
    ("教育", "education"),
    ("医疗", "healthcare"),
    ("金融", "finance"),
    ("电商", "e-commerce"),
    ("游戏", "gaming"),
    ("娱乐", "entertainment"),
    ("旅游", "travel"),
    ("餐饮", "restaurant"),
    ("零售", "retail"),
    ("物流", "logistics"),
    ("现代", "modern"),
    ("简约", "minimalist"),
    ("专业", "professional"),
    ("创新", "innovative"),
    ("时尚", "stylish"),
    ("优雅", "elegant"),
    ("友好", "friendly"),
    ("温暖", "warm"),
    ("清新", "fresh"),
    ("动态", "dynamic"),
];

pub const TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        patterns: &["登录", "注册", "用户", "账户", "密码"],
        phrase: "user authentication interface, login screen, secure access",
    },
    TopicRule {
        patterns: &["购物", "商品", "价格", "订单", "支付"],
        phrase: "e-commerce interface, online shopping, product display",
    },
    TopicRule {
        patterns: &["搜索", "查找", "筛选", "结果"],
        phrase: "search interface, data filtering, results display",
    },
    TopicRule {
        patterns: &["图表", "数据", "统计", "报告", "分析"],
        phrase: "data visualization, charts and graphs, analytics dashboard",
    },
    TopicRule {
        patterns: &["消息", "聊天", "通知", "沟通"],
        phrase: "messaging interface, communication app, chat design",
    },
    TopicRule {
        patterns: &["设置", "配置", "偏好", "选项"],
        phrase: "settings interface, configuration panel, user preferences",
    },
    TopicRule {
        patterns: &["文档", "文章", "内容", "编辑"],
        phrase: "document interface, content management, text editor",
    },
    TopicRule {
        patterns: &["地图", "位置", "导航", "路线"],
        phrase: "map interface, location services, navigation app",
    },
    TopicRule {
        patterns: &["音乐", "视频", "媒体", "播放"],
        phrase: "media player interface, entertainment app, multimedia",
    },
    TopicRule {
        patterns: &["健康", "医疗", "运动", "健身"],
        phrase: "health and fitness app, medical interface, wellness design",
    },
];

pub const SAMPLE_PROMPTS: &[&str] = &[
    "modern web dashboard, clean interface design, professional layout, high quality",
    "user profile interface, minimalist design, user-friendly layout, good composition",
    "e-commerce product display, clean product showcase, modern design, well lit",
    "data visualization dashboard, charts and graphs, professional analytics, clean layout",
    "mobile app interface, modern UI design, user-friendly, high quality rendering",
];

pub fn style_phrase(style: Style) -> &'static str {
    match style {
        Style::Realistic => "photorealistic, high quality, professional photography",
        Style::Illustration => "digital illustration, vector art, clean design",
        Style::Cartoon => "cartoon style, friendly, colorful illustration",
        Style::Artistic => "artistic design, creative illustration, modern art style",
    }
}

pub fn quality_phrase(quality: Quality) -> &'static str {
    match quality {
        Quality::Standard => "good quality",
        Quality::High => "high quality, detailed",
        Quality::Ultra => "ultra high quality, 4K, highly detailed, professional",
    }
}

pub fn image_type_suffix(image_type: ImageType) -> &'static str {
    match image_type {
        ImageType::Hero => "hero image, banner style, wide format",
        ImageType::Icon => "icon design, simple, clear, recognizable",
        ImageType::Illustration => "detailed illustration, artistic style",
        ImageType::Photo => "photorealistic, natural lighting, authentic",
    }
}
