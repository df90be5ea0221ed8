//! Mandarin romanization: HanYu pinyin → TongYong, Wade-Giles, GuoYin.
//!
//! Conversion is per syllable. The tone is read off the HanYu diacritic,
//! the bare syllable is looked up in [`SYLLABLES`], and the tone is put
//! back on the vowel the target system marks (a > o > e > ui > u > ü > i).

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use super::System;

/// HanYu (ü written `v`) → (TongYong, Wade-Giles, GuoYin).
#[rustfmt::skip]
const SYLLABLES: &[(&str, &str, &str, &str)] = &[
    ("a", "a", "a", "a"),
    ("o", "o", "o", "o"),
    ("e", "e", "o", "e"),
    ("ai", "ai", "ai", "ai"),
    ("ei", "ei", "ei", "ei"),
    ("ao", "ao", "ao", "ao"),
    ("ou", "ou", "ou", "ou"),
    ("an", "an", "an", "an"),
    ("en", "en", "en", "en"),
    ("ang", "ang", "ang", "ang"),
    ("eng", "eng", "eng", "eng"),
    ("er", "er", "erh", "er"),
    ("ba", "ba", "pa", "ba"),
    ("bo", "bo", "po", "bo"),
    ("bai", "bai", "pai", "bai"),
    ("bei", "bei", "pei", "bei"),
    ("bao", "bao", "pao", "bao"),
    ("ban", "ban", "pan", "ban"),
    ("ben", "ben", "pen", "ben"),
    ("bang", "bang", "pang", "bang"),
    ("beng", "bong", "peng", "beng"),
    ("bi", "bi", "pi", "bi"),
    ("bie", "bie", "pieh", "bie"),
    ("biao", "biao", "piao", "biao"),
    ("bian", "bian", "pien", "bian"),
    ("bin", "bin", "pin", "bin"),
    ("bing", "bing", "ping", "bing"),
    ("bu", "bu", "pu", "bu"),
    ("pa", "pa", "p'a", "pa"),
    ("po", "po", "p'o", "po"),
    ("pai", "pai", "p'ai", "pai"),
    ("pei", "pei", "p'ei", "pei"),
    ("pao", "pao", "p'ao", "pao"),
    ("pou", "pou", "p'ou", "pou"),
    ("pan", "pan", "p'an", "pan"),
    ("pen", "pen", "p'en", "pen"),
    ("pang", "pang", "p'ang", "pang"),
    ("peng", "pong", "p'eng", "peng"),
    ("pi", "pi", "p'i", "pi"),
    ("pie", "pie", "p'ieh", "pie"),
    ("piao", "piao", "p'iao", "piao"),
    ("pian", "pian", "p'ien", "pian"),
    ("pin", "pin", "p'in", "pin"),
    ("ping", "ping", "p'ing", "ping"),
    ("pu", "pu", "p'u", "pu"),
    ("ma", "ma", "ma", "ma"),
    ("mo", "mo", "mo", "mo"),
    ("me", "me", "me", "me"),
    ("mai", "mai", "mai", "mai"),
    ("mei", "mei", "mei", "mei"),
    ("mao", "mao", "mao", "mao"),
    ("mou", "mou", "mou", "mou"),
    ("man", "man", "man", "man"),
    ("men", "men", "men", "men"),
    ("mang", "mang", "mang", "mang"),
    ("meng", "mong", "meng", "meng"),
    ("mi", "mi", "mi", "mi"),
    ("mie", "mie", "mieh", "mie"),
    ("miao", "miao", "miao", "miao"),
    ("miu", "miou", "miu", "miou"),
    ("mian", "mian", "mien", "mian"),
    ("min", "min", "min", "min"),
    ("ming", "ming", "ming", "ming"),
    ("mu", "mu", "mu", "mu"),
    ("fa", "fa", "fa", "fa"),
    ("fo", "fo", "fo", "fo"),
    ("fei", "fei", "fei", "fei"),
    ("fou", "fou", "fou", "fou"),
    ("fan", "fan", "fan", "fan"),
    ("fen", "fen", "fen", "fen"),
    ("fang", "fang", "fang", "fang"),
    ("feng", "fong", "feng", "feng"),
    ("fu", "fu", "fu", "fu"),
    ("da", "da", "ta", "da"),
    ("de", "de", "te", "de"),
    ("dai", "dai", "tai", "dai"),
    ("dei", "dei", "tei", "dei"),
    ("dao", "dao", "tao", "dao"),
    ("dou", "dou", "tou", "dou"),
    ("dan", "dan", "tan", "dan"),
    ("den", "den", "ten", "den"),
    ("dang", "dang", "tang", "dang"),
    ("deng", "deng", "teng", "deng"),
    ("dong", "dong", "tung", "dung"),
    ("di", "di", "ti", "di"),
    ("die", "die", "tieh", "die"),
    ("diao", "diao", "tiao", "diao"),
    ("diu", "diou", "tiu", "diou"),
    ("dian", "dian", "tien", "dian"),
    ("ding", "ding", "ting", "ding"),
    ("du", "du", "tu", "du"),
    ("duo", "duo", "to", "duo"),
    ("dui", "duei", "tui", "duei"),
    ("duan", "duan", "tuan", "duan"),
    ("dun", "dun", "tun", "duen"),
    ("ta", "ta", "t'a", "ta"),
    ("te", "te", "t'e", "te"),
    ("tai", "tai", "t'ai", "tai"),
    ("tao", "tao", "t'ao", "tao"),
    ("tou", "tou", "t'ou", "tou"),
    ("tan", "tan", "t'an", "tan"),
    ("tang", "tang", "t'ang", "tang"),
    ("teng", "teng", "t'eng", "teng"),
    ("tong", "tong", "t'ung", "tung"),
    ("ti", "ti", "t'i", "ti"),
    ("tie", "tie", "t'ieh", "tie"),
    ("tiao", "tiao", "t'iao", "tiao"),
    ("tian", "tian", "t'ien", "tian"),
    ("ting", "ting", "t'ing", "ting"),
    ("tu", "tu", "t'u", "tu"),
    ("tuo", "tuo", "t'o", "tuo"),
    ("tui", "tuei", "t'ui", "tuei"),
    ("tuan", "tuan", "t'uan", "tuan"),
    ("tun", "tun", "t'un", "tuen"),
    ("na", "na", "na", "na"),
    ("ne", "ne", "ne", "ne"),
    ("nai", "nai", "nai", "nai"),
    ("nei", "nei", "nei", "nei"),
    ("nao", "nao", "nao", "nao"),
    ("nou", "nou", "nou", "nou"),
    ("nan", "nan", "nan", "nan"),
    ("nen", "nen", "nen", "nen"),
    ("nang", "nang", "nang", "nang"),
    ("neng", "neng", "neng", "neng"),
    ("nong", "nong", "nung", "nung"),
    ("ni", "ni", "ni", "ni"),
    ("nie", "nie", "nieh", "nie"),
    ("niao", "niao", "niao", "niao"),
    ("niu", "niou", "niu", "niou"),
    ("nian", "nian", "nien", "nian"),
    ("nin", "nin", "nin", "nin"),
    ("niang", "niang", "niang", "niang"),
    ("ning", "ning", "ning", "ning"),
    ("nu", "nu", "nu", "nu"),
    ("nuo", "nuo", "no", "nuo"),
    ("nuan", "nuan", "nuan", "nuan"),
    ("nv", "nyu", "nü", "niu"),
    ("nve", "nyue", "nüeh", "niue"),
    ("la", "la", "la", "la"),
    ("le", "le", "le", "le"),
    ("lai", "lai", "lai", "lai"),
    ("lei", "lei", "lei", "lei"),
    ("lao", "lao", "lao", "lao"),
    ("lou", "lou", "lou", "lou"),
    ("lan", "lan", "lan", "lan"),
    ("lang", "lang", "lang", "lang"),
    ("leng", "leng", "leng", "leng"),
    ("long", "long", "lung", "lung"),
    ("li", "li", "li", "li"),
    ("lia", "lia", "lia", "lia"),
    ("lie", "lie", "lieh", "lie"),
    ("liao", "liao", "liao", "liao"),
    ("liu", "liou", "liu", "liou"),
    ("lian", "lian", "lien", "lian"),
    ("lin", "lin", "lin", "lin"),
    ("liang", "liang", "liang", "liang"),
    ("ling", "ling", "ling", "ling"),
    ("lu", "lu", "lu", "lu"),
    ("luo", "luo", "lo", "luo"),
    ("luan", "luan", "luan", "luan"),
    ("lun", "lun", "lun", "luen"),
    ("lv", "lyu", "lü", "liu"),
    ("lve", "lyue", "lüeh", "liue"),
    ("ga", "ga", "ka", "ga"),
    ("ge", "ge", "ko", "ge"),
    ("gai", "gai", "kai", "gai"),
    ("gei", "gei", "kei", "gei"),
    ("gao", "gao", "kao", "gao"),
    ("gou", "gou", "kou", "gou"),
    ("gan", "gan", "kan", "gan"),
    ("gen", "gen", "ken", "gen"),
    ("gang", "gang", "kang", "gang"),
    ("geng", "geng", "keng", "geng"),
    ("gong", "gong", "kung", "gung"),
    ("gu", "gu", "ku", "gu"),
    ("gua", "gua", "kua", "gua"),
    ("guo", "guo", "kuo", "guo"),
    ("guai", "guai", "kuai", "guai"),
    ("gui", "guei", "kuei", "guei"),
    ("guan", "guan", "kuan", "guan"),
    ("gun", "gun", "kun", "guen"),
    ("guang", "guang", "kuang", "guang"),
    ("ka", "ka", "k'a", "ka"),
    ("ke", "ke", "k'o", "ke"),
    ("kai", "kai", "k'ai", "kai"),
    ("kei", "kei", "k'ei", "kei"),
    ("kao", "kao", "k'ao", "kao"),
    ("kou", "kou", "k'ou", "kou"),
    ("kan", "kan", "k'an", "kan"),
    ("ken", "ken", "k'en", "ken"),
    ("kang", "kang", "k'ang", "kang"),
    ("keng", "keng", "k'eng", "keng"),
    ("kong", "kong", "k'ung", "kung"),
    ("ku", "ku", "k'u", "ku"),
    ("kua", "kua", "k'ua", "kua"),
    ("kuo", "kuo", "k'uo", "kuo"),
    ("kuai", "kuai", "k'uai", "kuai"),
    ("kui", "kuei", "k'uei", "kuei"),
    ("kuan", "kuan", "k'uan", "kuan"),
    ("kun", "kun", "k'un", "kuen"),
    ("kuang", "kuang", "k'uang", "kuang"),
    ("ha", "ha", "ha", "ha"),
    ("he", "he", "ho", "he"),
    ("hai", "hai", "hai", "hai"),
    ("hei", "hei", "hei", "hei"),
    ("hao", "hao", "hao", "hao"),
    ("hou", "hou", "hou", "hou"),
    ("han", "han", "han", "han"),
    ("hen", "hen", "hen", "hen"),
    ("hang", "hang", "hang", "hang"),
    ("heng", "heng", "heng", "heng"),
    ("hong", "hong", "hung", "hung"),
    ("hu", "hu", "hu", "hu"),
    ("hua", "hua", "hua", "hua"),
    ("huo", "huo", "huo", "huo"),
    ("huai", "huai", "huai", "huai"),
    ("hui", "huei", "hui", "huei"),
    ("huan", "huan", "huan", "huan"),
    ("hun", "hun", "hun", "huen"),
    ("huang", "huang", "huang", "huang"),
    ("ji", "ji", "chi", "ji"),
    ("jia", "jia", "chia", "jia"),
    ("jie", "jie", "chieh", "jie"),
    ("jiao", "jiao", "chiao", "jiao"),
    ("jiu", "jiou", "chiu", "jiou"),
    ("jian", "jian", "chien", "jian"),
    ("jin", "jin", "chin", "jin"),
    ("jiang", "jiang", "chiang", "jiang"),
    ("jing", "jing", "ching", "jing"),
    ("jiong", "jyong", "chiung", "jiung"),
    ("ju", "jyu", "chü", "jiu"),
    ("jue", "jyue", "chüeh", "jiue"),
    ("juan", "jyuan", "chüan", "jiuan"),
    ("jun", "jyun", "chün", "jiun"),
    ("qi", "ci", "ch'i", "chi"),
    ("qia", "cia", "ch'ia", "chia"),
    ("qie", "cie", "ch'ieh", "chie"),
    ("qiao", "ciao", "ch'iao", "chiao"),
    ("qiu", "ciou", "ch'iu", "chiou"),
    ("qian", "cian", "ch'ien", "chian"),
    ("qin", "cin", "ch'in", "chin"),
    ("qiang", "ciang", "ch'iang", "chiang"),
    ("qing", "cing", "ch'ing", "ching"),
    ("qiong", "cyong", "ch'iung", "chiung"),
    ("qu", "cyu", "ch'ü", "chiu"),
    ("que", "cyue", "ch'üeh", "chiue"),
    ("quan", "cyuan", "ch'üan", "chiuan"),
    ("qun", "cyun", "ch'ün", "chiun"),
    ("xi", "si", "hsi", "shi"),
    ("xia", "sia", "hsia", "shia"),
    ("xie", "sie", "hsieh", "shie"),
    ("xiao", "siao", "hsiao", "shiao"),
    ("xiu", "siou", "hsiu", "shiou"),
    ("xian", "sian", "hsien", "shian"),
    ("xin", "sin", "hsin", "shin"),
    ("xiang", "siang", "hsiang", "shiang"),
    ("xing", "sing", "hsing", "shing"),
    ("xiong", "syong", "hsiung", "shiung"),
    ("xu", "syu", "hsü", "shiu"),
    ("xue", "syue", "hsüeh", "shiue"),
    ("xuan", "syuan", "hsüan", "shiuan"),
    ("xun", "syun", "hsün", "shiun"),
    ("zhi", "jhih", "chih", "jr"),
    ("zha", "jha", "cha", "ja"),
    ("zhe", "jhe", "che", "je"),
    ("zhai", "jhai", "chai", "jai"),
    ("zhei", "jhei", "chei", "jei"),
    ("zhao", "jhao", "chao", "jao"),
    ("zhou", "jhou", "chou", "jou"),
    ("zhan", "jhan", "chan", "jan"),
    ("zhen", "jhen", "chen", "jen"),
    ("zhang", "jhang", "chang", "jang"),
    ("zheng", "jheng", "cheng", "jeng"),
    ("zhong", "jhong", "chung", "jung"),
    ("zhu", "jhu", "chu", "ju"),
    ("zhua", "jhua", "chua", "jua"),
    ("zhuo", "jhuo", "cho", "juo"),
    ("zhuai", "jhuai", "chuai", "juai"),
    ("zhui", "jhuei", "chui", "juei"),
    ("zhuan", "jhuan", "chuan", "juan"),
    ("zhun", "jhun", "chun", "juen"),
    ("zhuang", "jhuang", "chuang", "juang"),
    ("chi", "chih", "ch'ih", "chr"),
    ("cha", "cha", "ch'a", "cha"),
    ("che", "che", "ch'e", "che"),
    ("chai", "chai", "ch'ai", "chai"),
    ("chao", "chao", "ch'ao", "chao"),
    ("chou", "chou", "ch'ou", "chou"),
    ("chan", "chan", "ch'an", "chan"),
    ("chen", "chen", "ch'en", "chen"),
    ("chang", "chang", "ch'ang", "chang"),
    ("cheng", "cheng", "ch'eng", "cheng"),
    ("chong", "chong", "ch'ung", "chung"),
    ("chu", "chu", "ch'u", "chu"),
    ("chua", "chua", "ch'ua", "chua"),
    ("chuo", "chuo", "ch'o", "chuo"),
    ("chuai", "chuai", "ch'uai", "chuai"),
    ("chui", "chuei", "ch'ui", "chuei"),
    ("chuan", "chuan", "ch'uan", "chuan"),
    ("chun", "chun", "ch'un", "chuen"),
    ("chuang", "chuang", "ch'uang", "chuang"),
    ("shi", "shih", "shih", "shr"),
    ("sha", "sha", "sha", "sha"),
    ("she", "she", "she", "she"),
    ("shai", "shai", "shai", "shai"),
    ("shei", "shei", "shei", "shei"),
    ("shao", "shao", "shao", "shao"),
    ("shou", "shou", "shou", "shou"),
    ("shan", "shan", "shan", "shan"),
    ("shen", "shen", "shen", "shen"),
    ("shang", "shang", "shang", "shang"),
    ("sheng", "sheng", "sheng", "sheng"),
    ("shu", "shu", "shu", "shu"),
    ("shua", "shua", "shua", "shua"),
    ("shuo", "shuo", "shuo", "shuo"),
    ("shuai", "shuai", "shuai", "shuai"),
    ("shui", "shuei", "shui", "shuei"),
    ("shuan", "shuan", "shuan", "shuan"),
    ("shun", "shun", "shun", "shuen"),
    ("shuang", "shuang", "shuang", "shuang"),
    ("ri", "rih", "jih", "r"),
    ("re", "re", "je", "re"),
    ("rao", "rao", "jao", "rao"),
    ("rou", "rou", "jou", "rou"),
    ("ran", "ran", "jan", "ran"),
    ("ren", "ren", "jen", "ren"),
    ("rang", "rang", "jang", "rang"),
    ("reng", "reng", "jeng", "reng"),
    ("rong", "rong", "jung", "rung"),
    ("ru", "ru", "ju", "ru"),
    ("rua", "rua", "jua", "rua"),
    ("ruo", "ruo", "jo", "ruo"),
    ("rui", "ruei", "jui", "ruei"),
    ("ruan", "ruan", "juan", "ruan"),
    ("run", "run", "jun", "ruen"),
    ("zi", "zih", "tzu", "tz"),
    ("za", "za", "tsa", "tza"),
    ("ze", "ze", "tse", "tze"),
    ("zai", "zai", "tsai", "tzai"),
    ("zei", "zei", "tsei", "tzei"),
    ("zao", "zao", "tsao", "tzao"),
    ("zou", "zou", "tsou", "tzou"),
    ("zan", "zan", "tsan", "tzan"),
    ("zen", "zen", "tsen", "tzen"),
    ("zang", "zang", "tsang", "tzang"),
    ("zeng", "zeng", "tseng", "tzeng"),
    ("zong", "zong", "tsung", "tzung"),
    ("zu", "zu", "tsu", "tzu"),
    ("zuo", "zuo", "tso", "tzuo"),
    ("zui", "zuei", "tsui", "tzuei"),
    ("zuan", "zuan", "tsuan", "tzuan"),
    ("zun", "zun", "tsun", "tzuen"),
    ("ci", "cih", "tz'u", "tsz"),
    ("ca", "ca", "ts'a", "tsa"),
    ("ce", "ce", "ts'e", "tse"),
    ("cai", "cai", "ts'ai", "tsai"),
    ("cao", "cao", "ts'ao", "tsao"),
    ("cou", "cou", "ts'ou", "tsou"),
    ("can", "can", "ts'an", "tsan"),
    ("cen", "cen", "ts'en", "tsen"),
    ("cang", "cang", "ts'ang", "tsang"),
    ("ceng", "ceng", "ts'eng", "tseng"),
    ("cong", "cong", "ts'ung", "tsung"),
    ("cu", "cu", "ts'u", "tsu"),
    ("cuo", "cuo", "ts'o", "tsuo"),
    ("cui", "cuei", "ts'ui", "tsuei"),
    ("cuan", "cuan", "ts'uan", "tsuan"),
    ("cun", "cun", "ts'un", "tsuen"),
    ("si", "sih", "ssu", "sz"),
    ("sa", "sa", "sa", "sa"),
    ("se", "se", "se", "se"),
    ("sai", "sai", "sai", "sai"),
    ("sao", "sao", "sao", "sao"),
    ("sou", "sou", "sou", "sou"),
    ("san", "san", "san", "san"),
    ("sen", "sen", "sen", "sen"),
    ("sang", "sang", "sang", "sang"),
    ("seng", "seng", "seng", "seng"),
    ("song", "song", "sung", "sung"),
    ("su", "su", "su", "su"),
    ("suo", "suo", "so", "suo"),
    ("sui", "suei", "sui", "suei"),
    ("suan", "suan", "suan", "suan"),
    ("sun", "sun", "sun", "suen"),
    ("yi", "yi", "i", "yi"),
    ("ya", "ya", "ya", "ya"),
    ("yo", "yo", "yo", "yo"),
    ("ye", "ye", "yeh", "ye"),
    ("yai", "yai", "yai", "yai"),
    ("yao", "yao", "yao", "yao"),
    ("you", "you", "yu", "you"),
    ("yan", "yan", "yen", "yan"),
    ("yin", "yin", "yin", "yin"),
    ("yang", "yang", "yang", "yang"),
    ("ying", "ying", "ying", "ying"),
    ("yong", "yong", "yung", "yung"),
    ("yu", "yu", "yü", "yu"),
    ("yue", "yue", "yüeh", "yue"),
    ("yuan", "yuan", "yüan", "yuan"),
    ("yun", "yun", "yün", "yun"),
    ("wu", "wu", "wu", "wu"),
    ("wa", "wa", "wa", "wa"),
    ("wo", "wo", "wo", "wo"),
    ("wai", "wai", "wai", "wai"),
    ("wei", "wei", "wei", "wei"),
    ("wan", "wan", "wan", "wan"),
    ("wen", "wun", "wen", "wen"),
    ("wang", "wang", "wang", "wang"),
    ("weng", "wong", "weng", "weng"),
];

struct Row {
    tong_yong: &'static str,
    wade_giles: &'static str,
    guo_yin: &'static str,
}

static TABLE: Lazy<FxHashMap<&'static str, Row>> = Lazy::new(|| {
    SYLLABLES
        .iter()
        .map(|&(han_yu, tong_yong, wade_giles, guo_yin)| (han_yu, Row { tong_yong, wade_giles, guo_yin }))
        .collect()
});

static SYLLABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-züÜāáǎàōóǒòēéěèīíǐìūúǔùǖǘǚǜ]+").expect("valid syllable regex")
});

/// Tone-marked forms of each vowel, indexed by tone (0 and 5 unmarked).
const TONED: [(char, [char; 6]); 6] = [
    ('a', ['a', 'ā', 'á', 'ǎ', 'à', 'a']),
    ('o', ['o', 'ō', 'ó', 'ǒ', 'ò', 'o']),
    ('e', ['e', 'ē', 'é', 'ě', 'è', 'e']),
    ('i', ['i', 'ī', 'í', 'ǐ', 'ì', 'i']),
    ('u', ['u', 'ū', 'ú', 'ǔ', 'ù', 'u']),
    ('ü', ['ü', 'ǖ', 'ǘ', 'ǚ', 'ǜ', 'ü']),
];

/// Convert every syllable in `yin` to `system`.
pub fn convert(yin: &str, system: System) -> String {
    SYLLABLE_RE
        .replace_all(yin, |caps: &regex::Captures<'_>| convert_syllable(&caps[0], system))
        .into_owned()
}

/// Convert one HanYu syllable, or return it unchanged if the table has no
/// entry for it.
pub fn convert_syllable(syllable: &str, system: System) -> String {
    let lower = syllable.to_lowercase();
    let (mut bare, tone) = strip_tone(&lower);

    // Rhotacized syllables (`kuàir`) are looked up without their `r`.
    let mut suffix = "";
    if !bare.starts_with('e') && bare.len() > 1 && bare.ends_with('r') {
        bare.pop();
        suffix = "r";
    }

    let Some(row) = TABLE.get(bare.as_str()) else {
        tracing::trace!(syllable, %system, "no romanization table entry");
        return syllable.to_string();
    };
    let target = match system {
        System::TongYong => row.tong_yong,
        System::WadeGiles => row.wade_giles,
        System::GuoYin => row.guo_yin,
        _ => return syllable.to_string(),
    };

    let mut out = apply_tone(target, tone);
    out.push_str(suffix);
    if syllable.chars().next().is_some_and(char::is_uppercase) {
        out = capitalize(&out);
    }
    out
}

/// Split a syllable into its bare form (ü as `v`) and tone 1–5.
fn strip_tone(syllable: &str) -> (String, usize) {
    let mut tone = 5;
    let bare = syllable
        .chars()
        .map(|c| {
            for (vowel, forms) in TONED {
                if let Some(t) = forms[1..5].iter().position(|&f| f == c) {
                    tone = t + 1;
                    return if vowel == 'ü' { 'v' } else { vowel };
                }
            }
            if c == 'ü' {
                'v'
            } else {
                c
            }
        })
        .filter(|&c| c != '\u{200B}')
        .collect();
    (bare, tone)
}

fn apply_tone(target: &str, tone: usize) -> String {
    let vowel = if target.contains('a') {
        'a'
    } else if target.contains('o') {
        'o'
    } else if target.contains('e') {
        'e'
    } else if target.contains("ui") {
        'i'
    } else if target.contains('u') {
        'u'
    } else if target.contains('ü') {
        'ü'
    } else if target.contains('i') {
        'i'
    } else {
        return target.to_string();
    };

    let marked = TONED
        .iter()
        .find(|(v, _)| *v == vowel)
        .map_or(vowel, |(_, forms)| forms[tone]);
    target.replacen(vowel, marked.encode_utf8(&mut [0u8; 4]), 1)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
