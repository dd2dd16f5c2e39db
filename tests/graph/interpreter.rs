use openlr_referencing::{Fow, Frc, NetworkInterpreter};

/// OpenStreetMap tags of a road.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tags {
    pub highway: String,
    pub junction: Option<String>,
}

/// Interprets the OpenStreetMap highway tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighwayInterpreter;

impl NetworkInterpreter<Tags> for HighwayInterpreter {
    fn extract(&self, tags: &Tags) -> Option<(Frc, Fow)> {
        let (highway, is_link) = match tags.highway.strip_suffix("_link") {
            Some(highway) => (highway, true),
            None => (tags.highway.as_str(), false),
        };

        let frc = match highway {
            "motorway" => Frc::Frc0,
            "trunk" => Frc::Frc1,
            "primary" => Frc::Frc2,
            "secondary" => Frc::Frc3,
            "tertiary" => Frc::Frc4,
            "unclassified" | "residential" => Frc::Frc5,
            "living_street" | "service" => Frc::Frc6,
            "track" | "road" => Frc::Frc7,
            _ => return None,
        };

        let fow = if tags.junction.as_deref() == Some("roundabout") {
            Fow::Roundabout
        } else if is_link {
            Fow::SlipRoad
        } else if frc == Frc::Frc0 {
            Fow::Motorway
        } else if frc == Frc::Frc7 {
            Fow::Other
        } else {
            Fow::SingleCarriageway
        };

        Some((frc, fow))
    }
}

#[test]
fn highway_interpreter_extract() {
    let tags = |highway: &str, junction: Option<&str>| Tags {
        highway: highway.to_owned(),
        junction: junction.map(str::to_owned),
    };

    assert_eq!(
        HighwayInterpreter.extract(&tags("motorway", None)),
        Some((Frc::Frc0, Fow::Motorway))
    );
    assert_eq!(
        HighwayInterpreter.extract(&tags("motorway_link", None)),
        Some((Frc::Frc0, Fow::SlipRoad))
    );
    assert_eq!(
        HighwayInterpreter.extract(&tags("secondary", None)),
        Some((Frc::Frc3, Fow::SingleCarriageway))
    );
    assert_eq!(
        HighwayInterpreter.extract(&tags("residential", Some("roundabout"))),
        Some((Frc::Frc5, Fow::Roundabout))
    );
    assert_eq!(HighwayInterpreter.extract(&tags("footway", None)), None);

    // unknown roads never match
    assert_eq!(
        HighwayInterpreter.match_score(&tags("footway", None), Frc::Frc7, Fow::Other),
        0.0
    );
}
