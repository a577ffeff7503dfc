/// Advisory attached when the predicted label has no dedicated entry.
pub const GENERIC_ADVISORY: &str = "This mushroom has been identified. Always consult an expert before handling or consuming any wild mushroom.";

const ADVISORIES: [(&str, &str); 4] = [
    (
        "edible",
        "This mushroom appears to be from an edible variety, though always consult an expert before consumption.",
    ),
    (
        "poisonous",
        "This mushroom appears to have characteristics consistent with poisonous varieties. Do not consume.",
    ),
    (
        "deadly",
        "This mushroom appears to be from a deadly variety. Do not consume under any circumstances.",
    ),
    (
        "conditionally_edible",
        "This mushroom may be edible under certain conditions, but always consult an expert before consumption.",
    ),
];

/// Look up the advisory for a label. Never fails and never returns an empty
/// string.
pub fn advisory_for(label: &str) -> &'static str {
    ADVISORIES
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, text)| *text)
        .unwrap_or(GENERIC_ADVISORY)
}
