use serde::Serialize;

/// Display metadata of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: &'static str,
    pub name: &'static str,
    pub thumb_id: &'static str,
    pub thumb_path: &'static str,
    /// Whether the topic is offered to readers.
    pub public: bool,
}

/// Read-only lookup of topic metadata.
#[cfg_attr(test, mockall::automock)]
pub trait TopicCatalog: Send + Sync {
    /// Look up a topic by id.
    fn get(&self, id: &str) -> Option<Topic>;

    /// Display name of a topic; unknown ids resolve to an empty string.
    fn resolve_name(&self, id: &str) -> String {
        self.get(id).map(|t| t.name.to_string()).unwrap_or_default()
    }

    /// Every topic, ordered by id.
    fn all(&self) -> Vec<Topic>;
}

/// Topic catalog backed by the compiled table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTopicCatalog;

impl StaticTopicCatalog {
    pub fn new() -> Self {
        Self
    }
}

impl TopicCatalog for StaticTopicCatalog {
    fn get(&self, id: &str) -> Option<Topic> {
        TOPICS.iter().find(|t| t.id == id).copied()
    }

    fn all(&self) -> Vec<Topic> {
        let mut topics = TOPICS.to_vec();
        topics.sort_by_key(|t| t.id);
        topics
    }
}

macro_rules! topic {
    ($id:literal, $name:literal, $thumb_id:literal, $thumb:literal, $public:literal) => {
        Topic {
            id: $id,
            name: $name,
            thumb_id: $thumb_id,
            thumb_path: concat!("fivemin-prod/topic-thumb/", $thumb),
            public: $public,
        }
    };
}

static TOPICS: &[Topic] = &[
    topic!("lifestyle", "Lifestyle", "c25decb56feccf32b56f3bbce1d0649e", "d6kqr2vxy7siuchz3ugj", false),
    topic!("food-and-cooking", "Food and Cooking", "a38d1f899a322069b57f93a3a2aa1a0b", "ufafc9pcz80k9obim4ly", false),
    topic!("technology", "Technology", "d7032d16343fe1a6330db626bf5feeaf", "n6rztxn2ujb5b1ccwhbn", true),
    topic!("finance", "Finance", "b386564e5f7bb336c6cda43377f8f21d", "ewjibbyowrykv0zjuqq7", true),
    topic!("parenting", "Parenting", "122e62251f9fb3d3e90091a47af983a8", "xkn9wwkwgpdybn0ynqds", false),
    topic!("sports", "Sports", "4710819168f02f59326504082b132ba7", "cheancimace34cd4jmib", false),
    topic!("beauty-and-skincare", "Beauty and Skincare", "391d0fbf180c1864e125ae2de2056f49", "vpfyyuihzwn1xsrcmu9x", false),
    topic!("home-improvement", "Home Improvement", "545a8568b81b52b21d323e54139f060a", "cxcp7mxut7g9qqdemxpp", false),
    topic!("education", "Education", "ea4a1994e29888ee339a83ba875b2498", "ezuokyiqie8apwdpunli", false),
    topic!("entertainment", "Entertainment", "5455004f1dc1f498d5a4c8ee9f00ecf9", "vubqex8sbphmqhgxyeb3", false),
    topic!("business", "Business", "62180034fffab4bd0b9e2e11c0418876", "nxzh4ihpddkqm0nputm4", true),
    topic!("travel", "Travel", "9406a84d081a8e72bfba2451c6900872", "rjpwglx0iavcdhukkhuy", false),
    topic!("health", "Health", "7124b21e721cc4477af37edd67ac2549", "cdagmwqtctswknvqzkxu", false),
    topic!("social", "Social", "9fb66dab59f3e0ff79ca57f3c7e1fbd1", "ti3kpjhcd155t4h5toom", false),
    topic!("relationships", "Relationships", "36dc7b9c0f4aaf4f56dd0165b7859d16", "zcdz5monp2zqeipuqzdu", false),
    topic!("science", "Science", "f41cd486d292306f036ab3b54cb9749d", "xtcbet9ywsfif7uiiayu", true),
    topic!("programming", "Programming", "e7b77657550f169f0a6d6f679283b222", "zmlt6ft5tyivzcfeejci", true),
];
