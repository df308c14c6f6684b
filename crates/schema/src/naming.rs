//! Names of the generated root fields.

use inflector::Inflector;

/// English plural of a type name, applied to its last word: `Movie` to `Movies`,
/// `Category` to `Categories`, `SalesPerson` to `SalesPeople`.
pub fn pluralize(name: &str) -> String {
    let split = name
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_uppercase())
        .map_or(0, |(index, _)| index);

    let (stem, word) = name.split_at(split);
    let plural = word.to_lowercase().to_plural();

    if word.starts_with(char::is_uppercase) {
        format!("{stem}{}", plural.to_pascal_case())
    } else {
        format!("{stem}{plural}")
    }
}

/// `movies` for `Movie`, unless overridden with `@plural(value: ...)`.
pub fn root_plural(type_name: &str, overridden: Option<&str>) -> String {
    match overridden {
        Some(plural) => plural.to_camel_case(),
        None => pluralize(type_name).to_camel_case(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("Movie", "Movies")]
    #[case("Category", "Categories")]
    #[case("Person", "People")]
    #[case("SalesPerson", "SalesPeople")]
    #[case("Box", "Boxes")]
    #[case("Match", "Matches")]
    #[case("Day", "Days")]
    #[case("Series", "Series")]
    #[case("Actor", "Actors")]
    fn plurals(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(pluralize(name), expected);
    }

    #[test]
    fn root_names() {
        assert_eq!(root_plural("Movie", None), "movies");
        assert_eq!(root_plural("ProgrammingLanguage", None), "programmingLanguages");
        assert_eq!(root_plural("Movie", Some("films")), "films");
    }
}
