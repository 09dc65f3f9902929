use crate::dataset::encode_char;
use crate::{ColumnMapping, ConvertError, ValueKind, ValueMapping, ValueRule, ValuesMapping};

/// Triples that are emitted per row in addition to the mapped columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Extra {
    None,
    /// `dct:temporal` from `start_date` and `end_date`.
    Calendar,
    /// `a dcat:Dataset` and `dct:temporal` from `feed_start_date` and `feed_end_date`.
    FeedInfo,
    /// The shape, the point geometry and the line string cache.
    Shapes,
    /// The point geometry and the parent station.
    Stops,
}

/// How one member file of a GTFS feed is converted.
#[derive(Debug, Clone)]
pub(crate) struct TableConfig {
    pub(crate) table: &'static str,
    pub(crate) dataset: &'static str,
    pub(crate) primary_prefix: String,
    pub(crate) primary_col: Option<&'static str>,
    pub(crate) column_mapping: ColumnMapping,
    pub(crate) values_mapping: ValuesMapping,
    pub(crate) extra: Extra,
}

fn columns(pairs: &[(&str, &str)]) -> ColumnMapping {
    pairs
        .iter()
        .map(|(column, predicate)| ((*column).to_owned(), Some((*predicate).to_owned())))
        .collect()
}

fn values(pairs: Vec<(&str, ValueMapping)>) -> ValuesMapping {
    pairs
        .into_iter()
        .map(|(predicate, mapping)| (predicate.to_owned(), mapping))
        .collect()
}

pub(crate) fn replace_nalph() -> Result<ValueRule, ConvertError> {
    ValueRule::with_fn(r"(?P<m>\W)", |caps| {
        encode_char(caps["m"].chars().next().unwrap_or_default())
    })
}

fn iri(rules: &[(&str, &str)]) -> Result<ValueMapping, ConvertError> {
    let rules = rules
        .iter()
        .map(|(search, replace)| ValueRule::new(search, *replace))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ValueMapping::new(rules, ValueKind::Iri))
}

fn identifier() -> Result<ValueMapping, ConvertError> {
    Ok(ValueMapping::new(vec![replace_nalph()?], ValueKind::Literal))
}

fn reference(prefix: &str, feed: &str) -> Result<ValueMapping, ConvertError> {
    Ok(ValueMapping::new(
        vec![
            replace_nalph()?,
            ValueRule::new("^(?P<content>.*)$", format!("gtfs:{prefix}_{feed}_${{content}}"))?,
        ],
        ValueKind::Iri,
    ))
}

fn int2bool() -> Result<ValueMapping, ConvertError> {
    iri(&[
        ("^0$", "\"false\"^^xsd:boolean"),
        ("^1$", "\"true\"^^xsd:boolean"),
    ])
}

fn date_addition2bool() -> Result<ValueMapping, ConvertError> {
    iri(&[
        ("^2$", "\"false\"^^xsd:boolean"),
        ("^1$", "\"true\"^^xsd:boolean"),
    ])
}

fn pickup_drop_off() -> Result<ValueMapping, ConvertError> {
    iri(&[
        ("^$", "gtfs:Regular"),
        ("^0$", "gtfs:Regular"),
        ("^1$", "gtfs:NotAvailable"),
        ("^2$", "gtfs:MustPhone"),
        ("^3$", "gtfs:MustCoordinateWithDriver"),
    ])
}

/// The supported tables of a feed, in conversion order.
pub(crate) fn table_configs(feed: &str) -> Result<Vec<TableConfig>, ConvertError> {
    let mut shape_columns = columns(&[
        ("shape_pt_lat", "geo:lat"),
        ("shape_pt_lon", "geo:long"),
        ("shape_pt_sequence", "gtfs:pointSequence"),
    ]);
    shape_columns.insert("shape_id".to_owned(), None);

    Ok(vec![
        TableConfig {
            table: "agency.txt",
            dataset: "Agency",
            primary_prefix: format!("gtfs:agency_{feed}_"),
            primary_col: Some("agency_id"),
            column_mapping: columns(&[
                ("agency_id", "dct:identifier"),
                ("agency_name", "foaf:name"),
                ("agency_url", "foaf:page"),
                ("agency_timezone", "gtfs:timeZone"),
                ("agency_lang", "dct:language"),
                ("agency_phone", "foaf:phone"),
            ]),
            values_mapping: values(vec![("dct:identifier", identifier()?)]),
            extra: Extra::None,
        },
        TableConfig {
            table: "calendar.txt",
            dataset: "CalendarRule",
            primary_prefix: format!("gtfs:calendar_{feed}_"),
            primary_col: None,
            column_mapping: columns(&[
                ("service_id", "gtfs:service"),
                ("monday", "gtfs:monday"),
                ("tuesday", "gtfs:tuesday"),
                ("wednesday", "gtfs:wednesday"),
                ("thursday", "gtfs:thursday"),
                ("friday", "gtfs:friday"),
                ("saturday", "gtfs:saturday"),
                ("sunday", "gtfs:sunday"),
                ("start_date", "schema:startDate"),
                ("end_date", "schema:endDate"),
            ]),
            values_mapping: values(vec![
                ("gtfs:service", reference("service", feed)?),
                ("gtfs:monday", int2bool()?),
                ("gtfs:tuesday", int2bool()?),
                ("gtfs:wednesday", int2bool()?),
                ("gtfs:thursday", int2bool()?),
                ("gtfs:friday", int2bool()?),
                ("gtfs:saturday", int2bool()?),
                ("gtfs:sunday", int2bool()?),
            ]),
            extra: Extra::Calendar,
        },
        TableConfig {
            table: "calendar_dates.txt",
            dataset: "CalendarDateRule",
            primary_prefix: format!("gtfs:calendar_date_{feed}_"),
            primary_col: None,
            column_mapping: columns(&[
                ("service_id", "gtfs:service"),
                ("date", "dct:date"),
                ("exception_type", "gtfs:dateAddition"),
            ]),
            values_mapping: values(vec![
                ("gtfs:service", reference("service", feed)?),
                ("gtfs:dateAddition", date_addition2bool()?),
            ]),
            extra: Extra::None,
        },
        TableConfig {
            table: "feed_info.txt",
            dataset: "Feed",
            primary_prefix: format!("gtfs:feed_{feed}_"),
            primary_col: None,
            column_mapping: columns(&[
                ("feed_publisher_url", "dct:publisher"),
                ("feed_lang", "dct:language"),
                ("feed_version", "schema:version"),
                ("feed_contact_mail", "dcat:contactPoint"),
                ("feed_publisher_name", "rdfs:label"),
                ("feed_start_date", "schema:startDate"),
                ("feed_end_date", "schema:endDate"),
            ]),
            values_mapping: ValuesMapping::new(),
            extra: Extra::FeedInfo,
        },
        TableConfig {
            table: "frequencies.txt",
            dataset: "Frequency",
            primary_prefix: format!("gtfs:frequency_{feed}_"),
            primary_col: None,
            column_mapping: columns(&[
                ("trip_id", "gtfs:trip"),
                ("start_time", "gtfs:startTime"),
                ("end_time", "gtfs:endTime"),
                ("headway_secs", "gtfs:headwaySeconds"),
                ("exact_times", "gtfs:exactTimes"),
            ]),
            values_mapping: values(vec![("gtfs:trip", reference("trip", feed)?)]),
            extra: Extra::None,
        },
        TableConfig {
            table: "routes.txt",
            dataset: "Route",
            primary_prefix: format!("gtfs:route_{feed}_"),
            primary_col: Some("route_id"),
            column_mapping: columns(&[
                ("route_id", "dct:identifier"),
                ("agency_id", "gtfs:agency"),
                ("route_short_name", "gtfs:shortName"),
                ("route_long_name", "gtfs:longName"),
                ("route_type", "gtfs:routeType"),
                ("route_color", "gtfs:color"),
                ("route_text_color", "gtfs:textColor"),
                ("route_desc", "dct:description"),
            ]),
            values_mapping: values(vec![
                ("dct:identifier", identifier()?),
                ("gtfs:agency", reference("agency", feed)?),
                (
                    "gtfs:routeType",
                    iri(&[
                        ("^0$", "gtfs:LightRail"),
                        ("^1$", "gtfs:Subway"),
                        ("^2$", "gtfs:Rail"),
                        ("^3$", "gtfs:Bus"),
                        ("^4$", "gtfs:Ferry"),
                        ("^5$", "gtfs:CableCar"),
                        ("^6$", "gtfs:Gondola"),
                        ("^7$", "gtfs:Funicular"),
                        (r"^(?P<v>\d+)$", "\"${v}\""),
                    ])?,
                ),
            ]),
            extra: Extra::None,
        },
        TableConfig {
            table: "shapes.txt",
            dataset: "ShapePoint",
            primary_prefix: format!("gtfs:shapepoint_{feed}_"),
            primary_col: None,
            column_mapping: shape_columns,
            values_mapping: ValuesMapping::new(),
            extra: Extra::Shapes,
        },
        TableConfig {
            table: "stops.txt",
            dataset: "Stop",
            primary_prefix: format!("gtfs:stop_{feed}_"),
            primary_col: Some("stop_id"),
            column_mapping: columns(&[
                ("stop_id", "dct:identifier"),
                ("stop_code", "gtfs:code"),
                ("stop_name", "foaf:name"),
                ("stop_desc", "dct:description"),
                ("stop_lat", "geo:lat"),
                ("stop_lon", "geo:long"),
                ("parent_station", "gtfs:parentStation"),
                ("wheelchair_boarding", "gtfs:wheelchairAccessible"),
                ("platform_code", "gtfs:platform"),
            ]),
            values_mapping: values(vec![
                ("dct:identifier", identifier()?),
                ("gtfs:parentStation", reference("station", feed)?),
            ]),
            extra: Extra::Stops,
        },
        TableConfig {
            table: "stop_times.txt",
            dataset: "StopTime",
            primary_prefix: format!("gtfs:stop_time_{feed}_"),
            primary_col: None,
            column_mapping: columns(&[
                ("trip_id", "gtfs:trip"),
                ("arrival_time", "gtfs:arrivalTime"),
                ("departure_time", "gtfs:departureTime"),
                ("stop_id", "gtfs:stop"),
                ("stop_sequence", "gtfs:stopSequence"),
                ("pickup_type", "gtfs:pickupType"),
                ("drop_off_type", "gtfs:dropOffType"),
                ("stop_headsign", "gtfs:headsign"),
            ]),
            values_mapping: values(vec![
                ("gtfs:trip", reference("trip", feed)?),
                ("gtfs:stop", reference("stop", feed)?),
                ("gtfs:pickupType", pickup_drop_off()?),
                ("gtfs:dropOffType", pickup_drop_off()?),
            ]),
            extra: Extra::None,
        },
        TableConfig {
            table: "transfers.txt",
            dataset: "TransferRule",
            primary_prefix: format!("gtfs:transfer_rule_{feed}_"),
            primary_col: None,
            column_mapping: columns(&[
                ("from_stop_id", "gtfs:originStop"),
                ("to_stop_id", "gtfs:destinationStop"),
                ("transfer_type", "gtfs:transferType"),
                ("min_transfer_time", "gtfs:minimumTransferTime"),
                ("from_route_id", "gtfs:originRoute"),
                ("to_route_id", "gtfs:destinationRoute"),
                ("from_trip_id", "gtfs:originTrip"),
                ("to_trip_id", "gtfs:destinationTrip"),
            ]),
            values_mapping: values(vec![
                (
                    "gtfs:transferType",
                    iri(&[
                        ("^0$", "gtfs:RecommendedTransfer"),
                        ("^1$", "gtfs:EnsuredTransfer"),
                        ("^2$", "gtfs:MinimumTimeTransfer"),
                        ("^3$", "gtfs:NoTransfer"),
                        ("^4$", "gtfs:InSeatTransfer"),
                        ("^5$", "gtfs:NoInSeatTransfer"),
                    ])?,
                ),
                ("gtfs:originStop", reference("stop", feed)?),
                ("gtfs:destinationStop", reference("stop", feed)?),
                ("gtfs:originRoute", reference("route", feed)?),
                ("gtfs:destinationRoute", reference("route", feed)?),
                ("gtfs:originTrip", reference("trip", feed)?),
                ("gtfs:destinationTrip", reference("trip", feed)?),
            ]),
            extra: Extra::None,
        },
        TableConfig {
            table: "trips.txt",
            dataset: "Trip",
            primary_prefix: format!("gtfs:trip_{feed}_"),
            primary_col: Some("trip_id"),
            column_mapping: columns(&[
                ("route_id", "gtfs:route"),
                ("service_id", "gtfs:service"),
                ("trip_id", "dct:identifier"),
                ("trip_headsign", "gtfs:headsign"),
                ("trip_short_name", "gtfs:shortName"),
                ("direction_id", "gtfs:direction"),
                ("block_id", "gtfs:block"),
                ("shape_id", "gtfs:shape"),
                ("wheelchair_accessible", "gtfs:wheelchairAccessible"),
                ("bikes_allowed", "gtfs:bikesAllowed"),
            ]),
            values_mapping: values(vec![
                ("dct:identifier", identifier()?),
                ("gtfs:service", reference("service", feed)?),
                ("gtfs:route", reference("route", feed)?),
                ("gtfs:shape", reference("shape", feed)?),
                ("gtfs:direction", int2bool()?),
                ("gtfs:wheelchairAccessible", int2bool()?),
                ("gtfs:bikesAllowed", int2bool()?),
            ]),
            extra: Extra::None,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config<'a>(configs: &'a [TableConfig], table: &str) -> &'a TableConfig {
        configs.iter().find(|c| c.table == table).unwrap()
    }

    #[test]
    fn references_are_feed_scoped() {
        let configs = table_configs("de").unwrap();
        let trips = config(&configs, "trips.txt");
        assert_eq!(
            trips.values_mapping["gtfs:route"].apply("R 1"),
            "gtfs:route_de_R0x0000201"
        );
        assert_eq!(trips.values_mapping["gtfs:direction"].apply("1"), "\"true\"^^xsd:boolean");
    }

    #[test]
    fn route_types() {
        let configs = table_configs("de").unwrap();
        let route_type = &config(&configs, "routes.txt").values_mapping["gtfs:routeType"];
        assert_eq!(route_type.apply("3"), "gtfs:Bus");
        assert_eq!(route_type.apply("700"), "\"700\"");
        assert_eq!(route_type.kind(), ValueKind::Iri);
    }

    #[test]
    fn table_order() {
        let tables = table_configs("x")
            .unwrap()
            .iter()
            .map(|c| c.table)
            .collect::<Vec<_>>();
        assert_eq!(
            tables,
            [
                "agency.txt",
                "calendar.txt",
                "calendar_dates.txt",
                "feed_info.txt",
                "frequencies.txt",
                "routes.txt",
                "shapes.txt",
                "stops.txt",
                "stop_times.txt",
                "transfers.txt",
                "trips.txt"
            ]
        );
    }
}
