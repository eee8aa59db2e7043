// src/services/language.rs

//! Language and script classification for free-text fields.
//!
//! Primary signal is Unicode block membership (Thai, Japanese kana,
//! Korean Hangul, CJK ideographs). CJK text is further disambiguated into
//! a Chinese script variant through a layered heuristic:
//!
//! 1. Hong-Kong-specific lexical markers tag `zh-hk` outright.
//! 2. Characters present in the simplified/traditional pair tables vote
//!    by ratio: > 0.7 simplified is `zh-cn`, < 0.3 is `zh-tw`.
//! 3. The middle band falls back to multi-character word patterns, with
//!    `zh-cn` on a tie.
//!
//! Statistical detection of non-CJK text is an external collaborator
//! behind [`ScriptFallback`]. Classification is stateless and
//! deterministic; batch classification is a plain map over texts.

use serde::{Deserialize, Serialize};

/// Language/script tag assigned to a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageTag {
    /// Simplified Chinese
    ZhCn,
    /// Traditional Chinese (Taiwan)
    ZhTw,
    /// Traditional Chinese (Hong Kong)
    ZhHk,
    /// Japanese
    Ja,
    /// Korean
    Ko,
    /// Thai
    Th,
    /// Tag supplied by the fallback detector
    Other(String),
    /// No block matched and no fallback was available
    Unknown,
}

impl LanguageTag {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ZhCn => "zh-cn",
            Self::ZhTw => "zh-tw",
            Self::ZhHk => "zh-hk",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Th => "th",
            Self::Other(tag) => tag,
            Self::Unknown => "und",
        }
    }

    /// Whether this tag names a Chinese script variant.
    pub fn is_chinese(&self) -> bool {
        matches!(self, Self::ZhCn | Self::ZhTw | Self::ZhHk)
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistical language detection for text no Unicode block resolves.
///
/// External collaborator; the crate ships no implementation.
pub trait ScriptFallback: Send + Sync {
    fn detect(&self, text: &str) -> Option<LanguageTag>;
}

/// Stateless classifier with an optional statistical fallback.
#[derive(Default)]
pub struct LanguageClassifier {
    fallback: Option<Box<dyn ScriptFallback>>,
}

impl LanguageClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: Box<dyn ScriptFallback>) -> Self {
        Self {
            fallback: Some(fallback),
        }
    }

    /// Assign a language/script tag to `text`.
    pub fn classify(&self, text: &str) -> LanguageTag {
        let mut kana = 0usize;
        let mut hangul = 0usize;
        let mut thai = 0usize;
        let mut cjk = 0usize;

        for c in text.chars() {
            match c {
                '\u{3040}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' => kana += 1,
                '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' => {
                    hangul += 1
                }
                '\u{0E00}'..='\u{0E7F}' => thai += 1,
                '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' => cjk += 1,
                _ => {}
            }
        }

        // Kana outranks ideographs: Japanese text mixes both.
        if kana > 0 {
            return LanguageTag::Ja;
        }
        if hangul > 0 {
            return LanguageTag::Ko;
        }
        if thai > 0 {
            return LanguageTag::Th;
        }
        if cjk > 0 {
            return chinese_variant(text);
        }

        self.fallback
            .as_ref()
            .and_then(|f| f.detect(text))
            .unwrap_or(LanguageTag::Unknown)
    }

    /// Classify a batch of texts. No shared state across calls.
    pub fn classify_batch<'a, I>(&self, texts: I) -> Vec<LanguageTag>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().map(|t| self.classify(t)).collect()
    }
}

/// Disambiguate the Chinese script variant of CJK text.
fn chinese_variant(text: &str) -> LanguageTag {
    // Tier 1: Hong Kong lexical markers decide outright.
    if HK_MARKERS.iter().any(|marker| text.contains(marker)) {
        return LanguageTag::ZhHk;
    }

    // Tier 2: ratio of simplified variant characters.
    let mut simplified = 0usize;
    let mut traditional = 0usize;
    for c in text.chars() {
        if CHAR_PAIRS.iter().any(|(s, _)| *s == c) {
            simplified += 1;
        } else if CHAR_PAIRS.iter().any(|(_, t)| *t == c) {
            traditional += 1;
        }
    }

    let variant_total = simplified + traditional;
    if variant_total > 0 {
        let ratio = simplified as f64 / variant_total as f64;
        if ratio > 0.7 {
            return LanguageTag::ZhCn;
        }
        if ratio < 0.3 {
            return LanguageTag::ZhTw;
        }
    }

    // Tier 3: curated word patterns; zh-cn wins ties.
    let cn_hits = CN_WORDS.iter().filter(|w| text.contains(*w)).count();
    let tw_hits = TW_WORDS.iter().filter(|w| text.contains(*w)).count();
    if tw_hits > cn_hits {
        LanguageTag::ZhTw
    } else {
        LanguageTag::ZhCn
    }
}

/// Lexical markers specific to Hong Kong written Cantonese and usage.
const HK_MARKERS: &[&str] = &[
    "香港", "嘅", "咗", "唔", "嚟", "冇", "乜", "啲", "睇", "佢", "咁", "喺", "嗰", "咩",
    "呢度", "點解", "而家", "幾好", "好正", "好靚", "港鐵", "茶餐廳", "飲茶", "屋企",
    "仲有", "係咪", "俾", "攞",
];

/// Simplified/traditional character pairs whose forms differ.
///
/// Characters shared by both scripts carry no signal and are omitted.
const CHAR_PAIRS: &[(char, char)] = &[
    ('国', '國'), ('东', '東'), ('车', '車'), ('门', '門'), ('马', '馬'), ('鸟', '鳥'),
    ('龙', '龍'), ('电', '電'), ('气', '氣'), ('华', '華'), ('万', '萬'), ('与', '與'),
    ('书', '書'), ('体', '體'), ('么', '麼'), ('义', '義'), ('乐', '樂'), ('习', '習'),
    ('乡', '鄉'), ('买', '買'), ('乱', '亂'), ('亚', '亞'), ('产', '產'), ('亲', '親'),
    ('亿', '億'), ('从', '從'), ('们', '們'), ('价', '價'), ('众', '眾'), ('优', '優'),
    ('会', '會'), ('伟', '偉'), ('传', '傳'), ('伤', '傷'), ('儿', '兒'), ('党', '黨'),
    ('兰', '蘭'), ('关', '關'), ('兴', '興'), ('养', '養'), ('军', '軍'), ('农', '農'),
    ('冲', '衝'), ('净', '淨'), ('凤', '鳳'), ('刘', '劉'), ('则', '則'), ('剑', '劍'),
    ('办', '辦'), ('动', '動'), ('劳', '勞'), ('势', '勢'), ('医', '醫'), ('单', '單'),
    ('卖', '賣'), ('卫', '衛'), ('厂', '廠'), ('历', '歷'), ('厅', '廳'), ('县', '縣'),
    ('发', '發'), ('变', '變'), ('叶', '葉'), ('号', '號'), ('听', '聽'), ('启', '啟'),
    ('吗', '嗎'), ('问', '問'), ('语', '語'), ('说', '說'), ('请', '請'), ('读', '讀'),
    ('谁', '誰'), ('调', '調'), ('谢', '謝'), ('质', '質'), ('贵', '貴'), ('费', '費'),
    ('资', '資'), ('赶', '趕'), ('转', '轉'), ('轻', '輕'), ('边', '邊'), ('过', '過'),
    ('还', '還'), ('这', '這'), ('进', '進'), ('远', '遠'), ('违', '違'), ('连', '連'),
    ('迟', '遲'), ('选', '選'), ('邮', '郵'), ('钟', '鐘'), ('钱', '錢'), ('铁', '鐵'),
    ('银', '銀'), ('错', '錯'), ('长', '長'), ('间', '間'), ('闲', '閒'), ('队', '隊'),
    ('阳', '陽'), ('阴', '陰'), ('难', '難'), ('雾', '霧'), ('页', '頁'), ('顶', '頂'),
    ('顺', '順'), ('须', '須'), ('顾', '顧'), ('题', '題'), ('风', '風'), ('飞', '飛'),
    ('饭', '飯'), ('饮', '飲'), ('馆', '館'), ('惊', '驚'), ('鱼', '魚'), ('点', '點'),
    ('热', '熱'), ('爱', '愛'), ('为', '為'), ('无', '無'), ('旧', '舊'), ('时', '時'),
    ('显', '顯'), ('术', '術'), ('机', '機'), ('杀', '殺'), ('条', '條'), ('来', '來'),
    ('极', '極'), ('构', '構'), ('标', '標'), ('树', '樹'), ('样', '樣'), ('桥', '橋'),
    ('检', '檢'), ('业', '業'), ('欢', '歡'), ('归', '歸'), ('当', '當'), ('录', '錄'),
    ('后', '後'), ('处', '處'), ('备', '備'), ('复', '復'), ('头', '頭'), ('夺', '奪'),
    ('妇', '婦'), ('妈', '媽'), ('孙', '孫'), ('学', '學'), ('宁', '寧'), ('实', '實'),
    ('写', '寫'), ('宽', '寬'), ('对', '對'), ('寻', '尋'), ('导', '導'), ('将', '將'),
    ('尔', '爾'), ('尘', '塵'), ('尝', '嘗'), ('团', '團'), ('园', '園'), ('围', '圍'),
    ('图', '圖'), ('圆', '圓'), ('块', '塊'), ('坚', '堅'), ('压', '壓'), ('声', '聲'),
    ('壶', '壺'), ('开', '開'), ('异', '異'), ('弃', '棄'), ('张', '張'), ('弹', '彈'),
    ('灭', '滅'), ('灯', '燈'), ('烟', '煙'), ('爷', '爺'), ('环', '環'), ('现', '現'),
    ('疗', '療'), ('盖', '蓋'), ('监', '監'), ('矿', '礦'), ('码', '碼'), ('礼', '禮'),
    ('离', '離'), ('种', '種'), ('积', '積'), ('称', '稱'), ('笔', '筆'), ('简', '簡'),
    ('纪', '紀'), ('约', '約'), ('红', '紅'), ('纯', '純'), ('纸', '紙'), ('级', '級'),
    ('细', '細'), ('织', '織'), ('终', '終'), ('经', '經'), ('给', '給'), ('络', '絡'),
    ('绝', '絕'), ('统', '統'), ('继', '繼'), ('续', '續'), ('维', '維'), ('绿', '綠'),
    ('网', '網'), ('罗', '羅'), ('脑', '腦'), ('脚', '腳'), ('脸', '臉'), ('舰', '艦'),
    ('艺', '藝'), ('节', '節'), ('苏', '蘇'), ('药', '藥'), ('营', '營'), ('虑', '慮'),
    ('视', '視'), ('览', '覽'), ('觉', '覺'), ('观', '觀'), ('规', '規'), ('讨', '討'),
    ('让', '讓'), ('议', '議'), ('讯', '訊'), ('记', '記'), ('讲', '講'), ('许', '許'),
    ('论', '論'), ('访', '訪'), ('证', '證'), ('评', '評'), ('识', '識'), ('诉', '訴'),
    ('词', '詞'), ('译', '譯'), ('试', '試'), ('诗', '詩'), ('话', '話'), ('询', '詢'),
    ('详', '詳'), ('误', '誤'), ('遗', '遺'), ('满', '滿'), ('汉', '漢'), ('汤', '湯'),
    ('没', '沒'), ('泪', '淚'), ('济', '濟'), ('湾', '灣'), ('灾', '災'), ('炉', '爐'),
];

/// Multi-character words preferred in mainland usage.
const CN_WORDS: &[&str] = &[
    "软件", "网络", "信息", "出租车", "公交", "视频", "打印", "数码", "鼠标", "硬盘",
    "酸奶", "地铁", "餐厅", "服务员", "土豆", "西红柿", "自行车", "空调", "冰激凌",
];

/// Multi-character words preferred in Taiwan usage.
const TW_WORDS: &[&str] = &[
    "軟體", "網路", "資訊", "計程車", "公車", "影片", "列印", "數位", "滑鼠", "硬碟",
    "優酪乳", "捷運", "餐廳", "服務生", "馬鈴薯", "番茄", "腳踏車", "冷氣", "冰淇淋",
];
