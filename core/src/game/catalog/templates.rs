use crate::game::{enums::Element, stats::BaseStats};

/// 불변 크리처 템플릿 (카드 한 종류)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureTemplate {
    pub name: &'static str,
    pub element: Element,
    pub stats: BaseStats,
    /// 이 템플릿이 가진 어빌리티, 표시 순서
    pub abilities: Vec<&'static str>,
}

impl CreatureTemplate {
    pub fn new(name: &'static str, element: Element, stats: BaseStats) -> Self {
        Self {
            name,
            element,
            stats,
            abilities: Vec::new(),
        }
    }

    pub fn with_abilities(mut self, abilities: &[&'static str]) -> Self {
        self.abilities = abilities.to_vec();
        self
    }

    pub fn has_ability(&self, name: &str) -> bool {
        self.abilities.iter().any(|ability| *ability == name)
    }
}
