use super::{
    CityMapper, CountryMapper, Keyed, MapperSet, RecordMapper, TranslationMapper,
};
use crate::reference::{CountryInfoTable, ReferenceTables};
use crate::tabular::{AlternateNameRecord, CountryInfoRecord, GeoRecord};
use geonames_core::{EntityAttributes, EntityClass, ExternalId};
use rstest::{fixture, rstest};

fn id(raw: u64) -> ExternalId {
    ExternalId::new(raw).expect("test identifiers are positive")
}

fn country_info(iso: &str, geoname_id: u64, continent: &str) -> CountryInfoRecord {
    CountryInfoRecord {
        iso: iso.to_owned(),
        iso3: format!("{iso}A"),
        iso_numeric: Some(840),
        fips: Some(iso.to_owned()),
        name: format!("Country {iso}"),
        capital: Some("Capital".to_owned()),
        area: Some(9_629_091.0),
        population: Some(327_167_434),
        continent: continent.to_owned(),
        tld: Some(format!(".{}", iso.to_lowercase())),
        currency_code: Some("USD".to_owned()),
        currency_name: Some("Dollar".to_owned()),
        phone: Some("1".to_owned()),
        postal_code_format: None,
        postal_code_regex: None,
        languages: Some("en-US".to_owned()),
        geoname_id: id(geoname_id),
        neighbours: Some("CA,MX".to_owned()),
        equivalent_fips_code: None,
    }
}

fn geo(geoname_id: u64, class: &str, code: &str, country: &str) -> GeoRecord {
    GeoRecord {
        geoname_id: id(geoname_id),
        name: "Name".to_owned(),
        ascii_name: Some("Ascii Name".to_owned()),
        alternate_names: None,
        latitude: 39.76,
        longitude: -98.5,
        feature_class: class.to_owned(),
        feature_code: code.to_owned(),
        country_code: country.to_owned(),
        cc2: None,
        admin1_code: Some("00".to_owned()),
        admin2_code: None,
        admin3_code: None,
        admin4_code: None,
        population: Some(10_000),
        elevation: None,
        dem: Some(537),
        timezone: Some("America/Chicago".to_owned()),
        modified_at: None,
    }
}

fn alternate_name(language: &str, name: &str) -> AlternateNameRecord {
    AlternateNameRecord {
        alternate_name_id: id(1_557_129),
        geoname_id: id(6_252_001),
        language: language.to_owned(),
        name: name.to_owned(),
        is_preferred: true,
        is_short: false,
        is_colloquial: false,
        is_historic: false,
        from: None,
        to: None,
    }
}

#[fixture]
fn references() -> ReferenceTables {
    ReferenceTables::new(CountryInfoTable::from_records([country_info(
        "US", 6_252_001, "NA",
    )]))
}

#[rstest]
#[case::continent(geo(6_255_149, "L", "CONT", ""), Some(EntityClass::Continent))]
#[case::country(geo(6_252_001, "A", "PCLI", "US"), Some(EntityClass::Country))]
#[case::division(geo(4_862_182, "A", "ADM1", "US"), Some(EntityClass::Division))]
#[case::city(geo(4_887_398, "P", "PPLA2", "US"), Some(EntityClass::City))]
#[case::unknown_continent(geo(123, "L", "CONT", ""), None)]
#[case::unlisted_country(geo(2_921_044, "A", "PCLI", "DE"), None)]
#[case::division_of_unknown_country(geo(2_950_157, "A", "ADM1", "DE"), None)]
#[case::city_of_unknown_country(geo(2_950_159, "P", "PPLC", "DE"), None)]
#[case::unlisted_feature_code(geo(5_128_581, "S", "HTL", "US"), None)]
#[case::populated_place_with_wrong_class(geo(5_128_582, "A", "PPL", "US"), None)]
fn routes_records_to_the_matching_mapper(
    references: ReferenceTables,
    #[case] record: GeoRecord,
    #[case] expected: Option<EntityClass>,
) {
    let mappers = MapperSet::new(&references, 0);
    let routed = mappers.route(&record).map(|mapper| mapper.entity_class());
    assert_eq!(routed, expected);
    assert_eq!(mappers.map(&record).map(|a| a.class()), expected);
}

#[rstest]
fn country_attributes_join_country_info(references: ReferenceTables) {
    let mapper = CountryMapper::new(&references);
    let record = geo(6_252_001, "A", "PCLI", "US");
    assert_eq!(record.external_id(), id(6_252_001));
    let Some(EntityAttributes::Country(country)) = mapper.map(&record) else {
        panic!("country record should map");
    };
    assert_eq!(country.code, "US");
    assert_eq!(country.iso3, "USA");
    assert_eq!(country.name, "Country US");
    assert_eq!(country.name_official.as_deref(), Some("Ascii Name"));
    assert_eq!(country.continent_id, Some(id(6_255_149)));
    assert_eq!(country.tld.as_deref(), Some(".us"));
    let place = country.place.expect("mapped countries carry place details");
    assert_eq!(place.feature_code, "PCLI");
    assert_eq!(place.dem, Some(537));
    assert_eq!(place.timezone_id.as_deref(), Some("America/Chicago"));
}

#[rstest]
fn name_official_falls_back_to_the_native_name(references: ReferenceTables) {
    let mapper = CountryMapper::new(&references);
    let mut record = geo(6_252_001, "A", "PCLI", "US");
    record.ascii_name = None;
    let Some(EntityAttributes::Country(country)) = mapper.map(&record) else {
        panic!("country record should map");
    };
    assert_eq!(country.name_official.as_deref(), Some("Name"));
}

#[rstest]
fn supply_builds_countries_from_reference_rows(references: ReferenceTables) {
    let mapper = CountryMapper::new(&references);
    let info = references.countries.by_iso("US").expect("US is listed");
    let EntityAttributes::Country(country) = mapper.supply(info) else {
        panic!("supply should build a country");
    };
    assert_eq!(country.code, "US");
    assert_eq!(country.name_official, None);
    assert_eq!(country.place, None);
    assert_eq!(country.continent_id, Some(id(6_255_149)));
}

#[rstest]
#[case(Some(14_999), false)]
#[case(Some(15_000), true)]
#[case(None, false)]
fn cities_respect_the_population_floor(
    references: ReferenceTables,
    #[case] population: Option<u64>,
    #[case] accepted: bool,
) {
    let mapper = CityMapper::new(&references.countries, 15_000);
    let mut record = geo(4_887_398, "P", "PPL", "US");
    record.population = population;
    assert_eq!(mapper.accepts(&record), accepted);
}

#[rstest]
#[case::real_language("de", "Vereinigte Staaten", true)]
#[case::postal_code("post", "10115", false)]
#[case::airport_code("iata", "JFK", false)]
#[case::wikidata_link("wkdt", "Q30", false)]
#[case::revolutionary_calendar("fr_1793", "Floréal", false)]
#[case::missing_language("", "Vereinigte Staaten", false)]
#[case::empty_name("de", "", false)]
fn translations_skip_pseudo_languages(
    #[case] language: &str,
    #[case] name: &str,
    #[case] accepted: bool,
) {
    let mapper = TranslationMapper::new();
    let record = alternate_name(language, name);
    assert_eq!(mapper.accepts(&record), accepted);
    assert_eq!(mapper.map(&record).is_some(), accepted);
}

#[rstest]
fn translations_honour_the_language_allow_list() {
    let mapper = TranslationMapper::new().with_languages(["en", " de "]);
    assert!(mapper.accepts(&alternate_name("de", "Berlin")));
    assert!(!mapper.accepts(&alternate_name("fr", "Berlin")));

    let everything = TranslationMapper::new().with_languages(Vec::<String>::new());
    assert!(everything.accepts(&alternate_name("fr", "Berlin")));
}

#[rstest]
fn translation_attributes_keep_flags_and_owner() {
    let record = alternate_name("de", "Vereinigte Staaten");
    assert_eq!(record.external_id(), id(1_557_129));
    let Some(EntityAttributes::Translation(translation)) = TranslationMapper::new().map(&record)
    else {
        panic!("translation should map");
    };
    assert_eq!(translation.geoname_id, id(6_252_001));
    assert!(translation.is_preferred);
    assert!(!translation.is_historic);
}
