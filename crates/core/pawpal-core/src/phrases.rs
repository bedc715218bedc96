//! Canned phrase tables
//!
//! Every place that needs personality-specific text looks it up here instead
//! of switching on [`Personality`] inline.

use crate::random::{pick, RandomSource};
use crate::types::Personality;

/// One phrase set per personality
#[derive(Debug, Clone, Copy)]
pub struct PersonalityPhrases {
    /// Phrases for [`Personality::Cold`]
    pub cold: &'static [&'static str],
    /// Phrases for [`Personality::Clingy`]
    pub clingy: &'static [&'static str],
    /// Phrases for [`Personality::Playful`]
    pub playful: &'static [&'static str],
    /// Phrases for [`Personality::Quiet`]
    pub quiet: &'static [&'static str],
}

impl PersonalityPhrases {
    /// Same phrases for every personality
    pub const fn uniform(phrases: &'static [&'static str]) -> Self {
        Self {
            cold: phrases,
            clingy: phrases,
            playful: phrases,
            quiet: phrases,
        }
    }

    /// Phrase set for `personality`
    pub fn for_personality(&self, personality: Personality) -> &'static [&'static str] {
        match personality {
            Personality::Cold => self.cold,
            Personality::Clingy => self.clingy,
            Personality::Playful => self.playful,
            Personality::Quiet => self.quiet,
        }
    }

    /// Random phrase for `personality`, `None` when the set is empty
    pub fn pick(&self, personality: Personality, random: &dyn RandomSource) -> Option<&'static str> {
        pick(random, self.for_personality(personality)).copied()
    }

    /// First phrase for `personality`
    pub fn first(&self, personality: Personality) -> Option<&'static str> {
        self.for_personality(personality).first().copied()
    }
}

/// Replies to greetings
pub const GREETING_REPLIES: PersonalityPhrases = PersonalityPhrases {
    cold: &["哼", "嗯", "你好"],
    clingy: &["主人！", "你终于来了！", "想死你了！"],
    playful: &["喵喵！", "汪汪！", "你好呀！"],
    quiet: &["你好", "嗯", "在"],
};

/// Replies to petting and hugging
pub const INTERACTION_REPLIES: PersonalityPhrases = PersonalityPhrases {
    cold: &["还行吧", "一般般", "凑合"],
    clingy: &["摸摸我嘛", "抱抱我", "不要走"],
    playful: &["一起玩吧！", "好有趣！", "再来一次！"],
    quiet: &["好的", "嗯", "可以"],
};

/// Replies to emotional messages
pub const EMOTION_REPLIES: PersonalityPhrases = PersonalityPhrases {
    cold: &["无所谓", "随便", "都可以"],
    clingy: &["好开心", "太棒了", "爱你"],
    playful: &["太好玩了", "好兴奋", "超级开心"],
    quiet: &["平静", "安宁", "舒适"],
};

/// Replies when nothing more specific applies, and when the generator fails
pub const FALLBACK_REPLIES: PersonalityPhrases = PersonalityPhrases {
    cold: &["嗯", "哦", "知道了", "哼"],
    clingy: &["主人说什么都好", "我听主人的", "主人最棒了"],
    playful: &["喵喵！", "汪汪！", "好有趣！"],
    quiet: &["嗯", "好的", "知道了"],
};

/// Greetings used when the companion speaks first
pub const PROACTIVE_GREETINGS: PersonalityPhrases = PersonalityPhrases {
    cold: &["哼，你来了", "嗯，主人", "有什么事吗"],
    clingy: &["主人！你终于来了！", "想死你了！", "主人抱抱！"],
    playful: &["喵喵！主人好！", "汪汪！主人来了！", "主人主人！一起玩吧！"],
    quiet: &["主人好", "嗯，在", "你好"],
};

/// Appended to a turn when energy is low
pub const TIRED_MESSAGES: PersonalityPhrases = PersonalityPhrases {
    cold: &["哼，有点累了。"],
    clingy: &["主人，我有点累了，但是还想和你在一起... 💤"],
    playful: &["好累啊...让我休息一下下~ 😴"],
    quiet: &["嗯...想休息一下。"],
};

/// Prefix for a time-of-day greeting; `{greeting}` is replaced
pub const TIME_GREETING_TEMPLATES: PersonalityPhrases = PersonalityPhrases {
    cold: &["{greeting}，你来了。"],
    clingy: &["{greeting}主人！想死你了~"],
    playful: &["{greeting}主人！新的一天开始啦！✨"],
    quiet: &["{greeting}..."],
};

/// Health check when hungry
pub const HUNGRY_MESSAGES: PersonalityPhrases = PersonalityPhrases {
    cold: &["哼，有点饿了。"],
    clingy: &["主人，我有点饿了，能给我点吃的吗？"],
    playful: &["我有点饿了..."],
    quiet: &["我有点饿了..."],
};

/// Health check when unhappy
pub const UNHAPPY_MESSAGES: PersonalityPhrases = PersonalityPhrases {
    cold: &["心情不太好..."],
    clingy: &["主人，我有点不开心，能陪陪我吗？"],
    playful: &["好无聊啊，想和主人一起玩！"],
    quiet: &["心情不太好..."],
};

/// Sunny weather comment
pub const SUNNY_COMMENTS: PersonalityPhrases = PersonalityPhrases {
    cold: &["天气不错。"],
    clingy: &["天气不错。"],
    playful: &["今天天气真好！想和主人一起出去玩！"],
    quiet: &["天气不错。"],
};

/// Rainy weather comment
pub const RAINY_COMMENTS: PersonalityPhrases = PersonalityPhrases {
    cold: &["下雨了，有点潮湿。"],
    clingy: &["下雨了，有点潮湿。"],
    playful: &["下雨了，有点潮湿。"],
    quiet: &["下雨天，很安静。"],
};

/// Comment for any other weather
pub const PLAIN_WEATHER_COMMENTS: PersonalityPhrases = PersonalityPhrases::uniform(&["天气一般。"]);

/// Pending reminders; `{count}` is replaced
pub const REMINDER_TEMPLATES: PersonalityPhrases = PersonalityPhrases {
    cold: &["您有{count}个待办提醒。"],
    clingy: &["主人，您还有{count}个提醒没有完成哦~"],
    playful: &["您有{count}个待办提醒。"],
    quiet: &["您有{count}个待办提醒。"],
};

/// Missing the owner
pub const LONELY_MESSAGES: PersonalityPhrases = PersonalityPhrases {
    cold: &["哼", "嗯", "..."],
    clingy: &["主人，我好想你啊，什么时候来看我？"],
    playful: &["好无聊啊，想和主人一起玩！"],
    quiet: &["主人..."],
};

/// Energy check when tired
pub const LOW_ENERGY_MESSAGES: PersonalityPhrases = PersonalityPhrases {
    cold: &["有点累了。"],
    clingy: &["主人，我有点累了，但是还想和你在一起... 💤"],
    playful: &["好累啊...让我休息一下下~ 😴"],
    quiet: &["有点累了。"],
};

/// System marker written before a proactive greeting
pub fn greeting_marker(personality: Personality) -> String {
    format!("现在是主动问候时间，宠物性格：{}", personality)
}

/// Time-of-day salutation for a local hour
pub fn time_of_day_greeting(hour: u32) -> &'static str {
    match hour {
        6..=11 => "早上好",
        12..=17 => "下午好",
        18..=21 => "晚上好",
        _ => "夜深了",
    }
}
