/// Entity categories emitted by [`RuleTagger`](super::RuleTagger).
///
/// Names follow the label scheme of common statistical NER models so reports
/// look the same whichever tagger produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLabel {
    Money,
    Percent,
    Date,
    Quantity,
    Org,
    Cardinal,
}

impl EntityLabel {
    /// Every label, in match priority order.
    pub const ALL: [EntityLabel; 6] = [
        EntityLabel::Money,
        EntityLabel::Percent,
        EntityLabel::Date,
        EntityLabel::Quantity,
        EntityLabel::Org,
        EntityLabel::Cardinal,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            EntityLabel::Money => "MONEY",
            EntityLabel::Percent => "PERCENT",
            EntityLabel::Date => "DATE",
            EntityLabel::Quantity => "QUANTITY",
            EntityLabel::Org => "ORG",
            EntityLabel::Cardinal => "CARDINAL",
        }
    }

    /// Lower wins when two candidate spans have the same extent.
    pub const fn priority(&self) -> usize {
        match self {
            EntityLabel::Money => 0,
            EntityLabel::Percent => 1,
            EntityLabel::Date => 2,
            EntityLabel::Quantity => 3,
            EntityLabel::Org => 4,
            EntityLabel::Cardinal => 5,
        }
    }

    pub const fn label_size() -> usize {
        6
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_matches_declaration_order() {
        assert_eq!(EntityLabel::ALL.len(), EntityLabel::label_size());
        for (idx, label) in EntityLabel::ALL.iter().enumerate() {
            assert_eq!(label.priority(), idx);
        }
        assert_eq!(EntityLabel::Quantity.to_string(), "QUANTITY");
    }
}
