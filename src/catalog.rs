//! Static lookup from model class id to a human readable sign name and
//! description.

use std::collections::HashMap;

pub const UNKNOWN_SIGN_NAME: &str = "Unknown Sign";
pub const UNKNOWN_SIGN_DESCRIPTION: &str = "Sign not recognized";

/// German traffic sign classes, indexed by class id.
const GTSRB_SIGNS: &[(&str, &str)] = &[
    (
        "Speed limit (20km/h)",
        "Maximum speed limit of 20 kilometers per hour. Typically found in highly pedestrianized areas or zones requiring extra caution.",
    ),
    (
        "Speed limit (30km/h)",
        "Maximum speed limit of 30 kilometers per hour. Common in residential areas and school zones.",
    ),
    (
        "Speed limit (50km/h)",
        "Maximum speed limit of 50 kilometers per hour. Standard speed limit in urban areas.",
    ),
    (
        "Speed limit (60km/h)",
        "Maximum speed limit of 60 kilometers per hour. Often found on major urban roads.",
    ),
    (
        "Speed limit (70km/h)",
        "Maximum speed limit of 70 kilometers per hour. Typical for roads transitioning between urban and rural areas.",
    ),
    (
        "Speed limit (80km/h)",
        "Maximum speed limit of 80 kilometers per hour. Common on rural roads and highways.",
    ),
    (
        "End of speed limit (80km/h)",
        "Indicates the end of the 80km/h speed limit zone. Return to standard speed limits.",
    ),
    (
        "Speed limit (100km/h)",
        "Maximum speed limit of 100 kilometers per hour. Typically found on highways and motorways.",
    ),
    (
        "Speed limit (120km/h)",
        "Maximum speed limit of 120 kilometers per hour. Common on major highways and motorways.",
    ),
    (
        "No passing",
        "Overtaking or passing other vehicles is prohibited. Stay in your lane.",
    ),
    (
        "No passing for vehicles over 3.5 metric tons",
        "Heavy vehicles weighing more than 3.5 metric tons are not allowed to overtake other vehicles.",
    ),
    (
        "Right-of-way at the next intersection",
        "You have priority at the upcoming intersection. Other vehicles must yield to you.",
    ),
    (
        "Priority road",
        "You are on a priority road. You have right of way at intersections.",
    ),
    (
        "Yield",
        "You must give way to other traffic. Stop if necessary and proceed only when safe.",
    ),
    (
        "Stop",
        "Come to a complete stop. Proceed only when safe and after yielding to other traffic.",
    ),
    (
        "No vehicles",
        "No vehicles of any kind are permitted beyond this point.",
    ),
    (
        "Vehicles over 3.5 metric tons prohibited",
        "Heavy vehicles exceeding 3.5 metric tons are not allowed on this road.",
    ),
    (
        "No entry",
        "Entry forbidden for all vehicles. Do not enter.",
    ),
    (
        "General caution",
        "Warning for a general hazard ahead. Proceed with increased attention.",
    ),
    (
        "Dangerous curve to the left",
        "Sharp bend ahead to the left. Reduce speed and prepare to turn.",
    ),
    (
        "Dangerous curve to the right",
        "Sharp bend ahead to the right. Reduce speed and prepare to turn.",
    ),
    (
        "Double curve",
        "Series of bends ahead. First curve could be either left or right. Reduce speed.",
    ),
    (
        "Bumpy road",
        "Road surface is uneven ahead. Reduce speed and prepare for bumps.",
    ),
    (
        "Slippery road",
        "Road surface may be slippery. Reduce speed and increase following distance.",
    ),
    (
        "Road narrows on the right",
        "The road becomes narrower on the right side ahead. Adjust position accordingly.",
    ),
    (
        "Road work",
        "Construction or maintenance work ahead. Reduce speed and watch for workers.",
    ),
    (
        "Traffic signals",
        "Traffic light ahead. Prepare to stop if the signal is red.",
    ),
    (
        "Pedestrians",
        "Pedestrian crossing ahead. Watch for people crossing the road.",
    ),
    (
        "Children crossing",
        "School zone or playground area. Watch for children crossing the road.",
    ),
    (
        "Bicycles crossing",
        "Bicycle crossing ahead. Watch for cyclists crossing or joining the road.",
    ),
    (
        "Beware of ice/snow",
        "Risk of ice or snow on the road. Adjust driving style for winter conditions.",
    ),
    (
        "Wild animals crossing",
        "Wildlife crossing area ahead. Watch for animals on the road.",
    ),
    (
        "End of all speed and passing limits",
        "Previous speed and passing restrictions end. Standard traffic rules apply.",
    ),
    (
        "Turn right ahead",
        "Mandatory right turn ahead. Prepare to turn right at the intersection.",
    ),
    (
        "Turn left ahead",
        "Mandatory left turn ahead. Prepare to turn left at the intersection.",
    ),
    (
        "Ahead only",
        "Must proceed straight ahead. No turning allowed.",
    ),
    (
        "Go straight or right",
        "Must either continue straight or turn right. No left turn allowed.",
    ),
    (
        "Go straight or left",
        "Must either continue straight or turn left. No right turn allowed.",
    ),
    (
        "Keep right",
        "Stay on the right side of the road or obstacle ahead.",
    ),
    (
        "Keep left",
        "Stay on the left side of the road or obstacle ahead.",
    ),
    (
        "Roundabout mandatory",
        "Must enter and follow the roundabout in the indicated direction.",
    ),
    (
        "End of no passing",
        "End of no-overtaking zone. Passing other vehicles is now allowed.",
    ),
    (
        "End of no passing by vehicles over 3.5 metric tons",
        "End of no-overtaking zone for heavy vehicles. Trucks may now pass other vehicles.",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInfo {
    pub name: String,
    pub description: String,
}

impl SignInfo {
    fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Read-only class id table, built once and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SignCatalog {
    signs: HashMap<i64, SignInfo>,
    fallback: SignInfo,
}

impl SignCatalog {
    /// The 43 class catalog the bundled sign model was trained on.
    pub fn gtsrb() -> Self {
        Self::from_entries(
            GTSRB_SIGNS
                .iter()
                .enumerate()
                .map(|(id, (name, description))| (id as i64, *name, *description)),
        )
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (i64, &'a str, &'a str)>) -> Self {
        let signs = entries
            .into_iter()
            .map(|(id, name, description)| (id, SignInfo::new(name, description)))
            .collect();

        Self {
            signs,
            fallback: SignInfo::new(UNKNOWN_SIGN_NAME, UNKNOWN_SIGN_DESCRIPTION),
        }
    }

    /// Never fails: unknown ids resolve to the "Unknown Sign" placeholder.
    pub fn lookup(&self, class_id: i64) -> &SignInfo {
        self.signs.get(&class_id).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, class_id: i64) -> bool {
        self.signs.contains_key(&class_id)
    }

    pub fn len(&self) -> usize {
        self.signs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signs.is_empty()
    }
}

impl Default for SignCatalog {
    fn default() -> Self {
        Self::gtsrb()
    }
}
