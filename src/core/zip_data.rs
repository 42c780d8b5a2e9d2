//! Built-in ZIP territory data: hand-checked ZIPs, numeric range rules and
//! county defaults. Overrides loaded at runtime take precedence over all of it.

use crate::domain::model::TdspCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Tdsp(TdspCode),
    /// Municipal utility or co-op outside retail choice.
    Utility(&'static str),
}

const ONCOR: Area = Area::Tdsp(TdspCode::Oncor);
const CNP: Area = Area::Tdsp(TdspCode::Centerpoint);
const AEPC: Area = Area::Tdsp(TdspCode::AepCentral);
const AEPN: Area = Area::Tdsp(TdspCode::AepNorth);
const TNMP: Area = Area::Tdsp(TdspCode::Tnmp);
const LPL: Area = Area::Tdsp(TdspCode::Lpl);

const AUSTIN_ENERGY: Area = Area::Utility("Austin Energy");
const CPS: Area = Area::Utility("CPS Energy");
const EPE: Area = Area::Utility("El Paso Electric");
const ENTERGY: Area = Area::Utility("Entergy Texas");
const XCEL: Area = Area::Utility("Xcel Energy");
const SWEPCO: Area = Area::Utility("Southwestern Electric Power Company");
const GARLAND: Area = Area::Utility("Garland Power & Light");
const DENTON_ME: Area = Area::Utility("Denton Municipal Electric");
const GEORGETOWN: Area = Area::Utility("Georgetown Utility Systems");
const NBU: Area = Area::Utility("New Braunfels Utilities");
const SAN_MARCOS: Area = Area::Utility("San Marcos Electric Utility");
const BTU: Area = Area::Utility("Bryan Texas Utilities");
const CSU: Area = Area::Utility("College Station Utilities");
const BPUB: Area = Area::Utility("Brownsville Public Utilities Board");
const GVEC: Area = Area::Utility("Guadalupe Valley Electric Cooperative");
const PEC: Area = Area::Utility("Pedernales Electric Cooperative");
const SPEC: Area = Area::Utility("South Plains Electric Cooperative");

pub const STATIC_CONFIDENCE: u8 = 97;
pub const SPLIT_CONFIDENCE: u8 = 60;

/// (zip, area, city, county)
pub static STATIC_ZIPS: &[(&str, Area, &str, &str)] = &[
    // Dallas
    ("75201", ONCOR, "Dallas", "Dallas"),
    ("75202", ONCOR, "Dallas", "Dallas"),
    ("75204", ONCOR, "Dallas", "Dallas"),
    ("75205", ONCOR, "University Park", "Dallas"),
    ("75206", ONCOR, "Dallas", "Dallas"),
    ("75214", ONCOR, "Dallas", "Dallas"),
    ("75219", ONCOR, "Dallas", "Dallas"),
    ("75225", ONCOR, "Dallas", "Dallas"),
    ("75230", ONCOR, "Dallas", "Dallas"),
    ("75240", ONCOR, "Dallas", "Dallas"),
    ("75243", ONCOR, "Dallas", "Dallas"),
    ("75248", ONCOR, "Dallas", "Dallas"),
    ("75252", ONCOR, "Dallas", "Collin"),
    // Collin / Denton suburbs
    ("75023", ONCOR, "Plano", "Collin"),
    ("75024", ONCOR, "Plano", "Collin"),
    ("75025", ONCOR, "Plano", "Collin"),
    ("75074", ONCOR, "Plano", "Collin"),
    ("75075", ONCOR, "Plano", "Collin"),
    ("75093", ONCOR, "Plano", "Collin"),
    ("75033", ONCOR, "Frisco", "Denton"),
    ("75034", ONCOR, "Frisco", "Collin"),
    ("75035", ONCOR, "Frisco", "Collin"),
    ("75069", ONCOR, "McKinney", "Collin"),
    ("75070", ONCOR, "McKinney", "Collin"),
    ("75071", ONCOR, "McKinney", "Collin"),
    ("75038", ONCOR, "Irving", "Dallas"),
    ("75039", ONCOR, "Irving", "Dallas"),
    ("75061", ONCOR, "Irving", "Dallas"),
    ("75062", ONCOR, "Irving", "Dallas"),
    ("75063", ONCOR, "Irving", "Dallas"),
    ("75040", GARLAND, "Garland", "Dallas"),
    ("75041", GARLAND, "Garland", "Dallas"),
    ("75042", GARLAND, "Garland", "Dallas"),
    ("75043", GARLAND, "Garland", "Dallas"),
    ("75044", GARLAND, "Garland", "Dallas"),
    ("75057", TNMP, "Lewisville", "Denton"),
    ("75067", TNMP, "Lewisville", "Denton"),
    ("75090", ONCOR, "Sherman", "Grayson"),
    ("75092", ONCOR, "Sherman", "Grayson"),
    // Tyler, Palestine
    ("75701", ONCOR, "Tyler", "Smith"),
    ("75702", ONCOR, "Tyler", "Smith"),
    ("75703", ONCOR, "Tyler", "Smith"),
    ("75801", ONCOR, "Palestine", "Anderson"),
    ("75803", ONCOR, "Palestine", "Anderson"),
    // Fort Worth / Arlington
    ("76010", ONCOR, "Arlington", "Tarrant"),
    ("76011", ONCOR, "Arlington", "Tarrant"),
    ("76012", ONCOR, "Arlington", "Tarrant"),
    ("76013", ONCOR, "Arlington", "Tarrant"),
    ("76014", ONCOR, "Arlington", "Tarrant"),
    ("76015", ONCOR, "Arlington", "Tarrant"),
    ("76016", ONCOR, "Arlington", "Tarrant"),
    ("76017", ONCOR, "Arlington", "Tarrant"),
    ("76018", ONCOR, "Arlington", "Tarrant"),
    ("76102", ONCOR, "Fort Worth", "Tarrant"),
    ("76104", ONCOR, "Fort Worth", "Tarrant"),
    ("76107", ONCOR, "Fort Worth", "Tarrant"),
    ("76109", ONCOR, "Fort Worth", "Tarrant"),
    ("76116", ONCOR, "Fort Worth", "Tarrant"),
    ("76132", ONCOR, "Fort Worth", "Tarrant"),
    ("76137", ONCOR, "Fort Worth", "Tarrant"),
    ("76244", ONCOR, "Fort Worth", "Tarrant"),
    ("76201", DENTON_ME, "Denton", "Denton"),
    ("76205", DENTON_ME, "Denton", "Denton"),
    ("76207", DENTON_ME, "Denton", "Denton"),
    ("76208", DENTON_ME, "Denton", "Denton"),
    ("76209", DENTON_ME, "Denton", "Denton"),
    ("76210", DENTON_ME, "Denton", "Denton"),
    // Wichita Falls, Stephenville, Killeen/Temple, Waco, Brownwood
    ("76301", ONCOR, "Wichita Falls", "Wichita"),
    ("76302", ONCOR, "Wichita Falls", "Wichita"),
    ("76308", ONCOR, "Wichita Falls", "Wichita"),
    ("76309", ONCOR, "Wichita Falls", "Wichita"),
    ("76310", ONCOR, "Wichita Falls", "Wichita"),
    ("76401", ONCOR, "Stephenville", "Erath"),
    ("76402", ONCOR, "Stephenville", "Erath"),
    ("76501", ONCOR, "Temple", "Bell"),
    ("76502", ONCOR, "Temple", "Bell"),
    ("76541", ONCOR, "Killeen", "Bell"),
    ("76542", ONCOR, "Killeen", "Bell"),
    ("76543", ONCOR, "Killeen", "Bell"),
    ("76701", ONCOR, "Waco", "McLennan"),
    ("76705", ONCOR, "Waco", "McLennan"),
    ("76706", ONCOR, "Waco", "McLennan"),
    ("76708", ONCOR, "Waco", "McLennan"),
    ("76710", ONCOR, "Waco", "McLennan"),
    ("76712", ONCOR, "Waco", "McLennan"),
    ("76801", ONCOR, "Brownwood", "Brown"),
    ("76802", ONCOR, "Brownwood", "Brown"),
    // San Angelo
    ("76901", AEPN, "San Angelo", "Tom Green"),
    ("76903", AEPN, "San Angelo", "Tom Green"),
    ("76904", AEPN, "San Angelo", "Tom Green"),
    // Houston
    ("77002", CNP, "Houston", "Harris"),
    ("77003", CNP, "Houston", "Harris"),
    ("77004", CNP, "Houston", "Harris"),
    ("77005", CNP, "Houston", "Harris"),
    ("77006", CNP, "Houston", "Harris"),
    ("77007", CNP, "Houston", "Harris"),
    ("77008", CNP, "Houston", "Harris"),
    ("77019", CNP, "Houston", "Harris"),
    ("77024", CNP, "Houston", "Harris"),
    ("77025", CNP, "Houston", "Harris"),
    ("77027", CNP, "Houston", "Harris"),
    ("77030", CNP, "Houston", "Harris"),
    ("77036", CNP, "Houston", "Harris"),
    ("77042", CNP, "Houston", "Harris"),
    ("77056", CNP, "Houston", "Harris"),
    ("77057", CNP, "Houston", "Harris"),
    ("77063", CNP, "Houston", "Harris"),
    ("77077", CNP, "Houston", "Harris"),
    ("77079", CNP, "Houston", "Harris"),
    ("77081", CNP, "Houston", "Harris"),
    ("77084", CNP, "Houston", "Harris"),
    ("77095", CNP, "Houston", "Harris"),
    ("77098", CNP, "Houston", "Harris"),
    ("77301", ENTERGY, "Conroe", "Montgomery"),
    ("77302", ENTERGY, "Conroe", "Montgomery"),
    ("77303", ENTERGY, "Conroe", "Montgomery"),
    ("77304", ENTERGY, "Conroe", "Montgomery"),
    ("77338", CNP, "Humble", "Harris"),
    ("77346", CNP, "Humble", "Harris"),
    ("77373", CNP, "Spring", "Harris"),
    ("77379", CNP, "Spring", "Harris"),
    ("77380", CNP, "The Woodlands", "Montgomery"),
    ("77381", CNP, "The Woodlands", "Montgomery"),
    ("77382", CNP, "The Woodlands", "Montgomery"),
    ("77388", CNP, "Spring", "Harris"),
    ("77389", CNP, "Spring", "Harris"),
    ("77429", CNP, "Cypress", "Harris"),
    ("77433", CNP, "Cypress", "Harris"),
    ("77449", CNP, "Katy", "Harris"),
    ("77450", CNP, "Katy", "Harris"),
    ("77494", CNP, "Katy", "Fort Bend"),
    ("77478", CNP, "Sugar Land", "Fort Bend"),
    ("77479", CNP, "Sugar Land", "Fort Bend"),
    ("77498", CNP, "Sugar Land", "Fort Bend"),
    ("77502", CNP, "Pasadena", "Harris"),
    ("77503", CNP, "Pasadena", "Harris"),
    ("77504", CNP, "Pasadena", "Harris"),
    ("77505", CNP, "Pasadena", "Harris"),
    ("77506", CNP, "Pasadena", "Harris"),
    ("77511", TNMP, "Alvin", "Brazoria"),
    ("77515", TNMP, "Angleton", "Brazoria"),
    ("77520", CNP, "Baytown", "Harris"),
    ("77521", CNP, "Baytown", "Harris"),
    ("77539", TNMP, "Dickinson", "Galveston"),
    ("77546", CNP, "Friendswood", "Galveston"),
    ("77550", CNP, "Galveston", "Galveston"),
    ("77551", CNP, "Galveston", "Galveston"),
    ("77554", CNP, "Galveston", "Galveston"),
    ("77568", TNMP, "La Marque", "Galveston"),
    ("77573", TNMP, "League City", "Galveston"),
    ("77581", CNP, "Pearland", "Brazoria"),
    ("77584", CNP, "Pearland", "Brazoria"),
    ("77590", TNMP, "Texas City", "Galveston"),
    ("77591", TNMP, "Texas City", "Galveston"),
    ("77640", ENTERGY, "Port Arthur", "Jefferson"),
    ("77642", ENTERGY, "Port Arthur", "Jefferson"),
    ("77701", ENTERGY, "Beaumont", "Jefferson"),
    ("77706", ENTERGY, "Beaumont", "Jefferson"),
    ("77801", BTU, "Bryan", "Brazos"),
    ("77802", BTU, "Bryan", "Brazos"),
    ("77803", BTU, "Bryan", "Brazos"),
    ("77840", CSU, "College Station", "Brazos"),
    ("77845", CSU, "College Station", "Brazos"),
    ("77901", AEPC, "Victoria", "Victoria"),
    ("77904", AEPC, "Victoria", "Victoria"),
    ("77979", AEPC, "Port Lavaca", "Calhoun"),
    // Laredo, Coastal Bend, Rio Grande Valley
    ("78040", AEPC, "Laredo", "Webb"),
    ("78041", AEPC, "Laredo", "Webb"),
    ("78043", AEPC, "Laredo", "Webb"),
    ("78045", AEPC, "Laredo", "Webb"),
    ("78046", AEPC, "Laredo", "Webb"),
    ("78130", NBU, "New Braunfels", "Comal"),
    ("78132", NBU, "New Braunfels", "Comal"),
    ("78201", CPS, "San Antonio", "Bexar"),
    ("78205", CPS, "San Antonio", "Bexar"),
    ("78209", CPS, "San Antonio", "Bexar"),
    ("78230", CPS, "San Antonio", "Bexar"),
    ("78249", CPS, "San Antonio", "Bexar"),
    ("78258", CPS, "San Antonio", "Bexar"),
    ("78332", AEPC, "Alice", "Jim Wells"),
    ("78363", AEPC, "Kingsville", "Kleberg"),
    ("78382", AEPC, "Rockport", "Aransas"),
    ("78401", AEPC, "Corpus Christi", "Nueces"),
    ("78404", AEPC, "Corpus Christi", "Nueces"),
    ("78405", AEPC, "Corpus Christi", "Nueces"),
    ("78411", AEPC, "Corpus Christi", "Nueces"),
    ("78412", AEPC, "Corpus Christi", "Nueces"),
    ("78413", AEPC, "Corpus Christi", "Nueces"),
    ("78414", AEPC, "Corpus Christi", "Nueces"),
    ("78415", AEPC, "Corpus Christi", "Nueces"),
    ("78418", AEPC, "Corpus Christi", "Nueces"),
    ("78501", AEPC, "McAllen", "Hidalgo"),
    ("78503", AEPC, "McAllen", "Hidalgo"),
    ("78504", AEPC, "McAllen", "Hidalgo"),
    ("78520", BPUB, "Brownsville", "Cameron"),
    ("78521", BPUB, "Brownsville", "Cameron"),
    ("78526", BPUB, "Brownsville", "Cameron"),
    ("78539", AEPC, "Edinburg", "Hidalgo"),
    ("78550", AEPC, "Harlingen", "Cameron"),
    ("78552", AEPC, "Harlingen", "Cameron"),
    ("78572", AEPC, "Mission", "Hidalgo"),
    ("78577", AEPC, "Pharr", "Hidalgo"),
    ("78596", AEPC, "Weslaco", "Hidalgo"),
    // Central Texas
    ("78626", GEORGETOWN, "Georgetown", "Williamson"),
    ("78628", GEORGETOWN, "Georgetown", "Williamson"),
    ("78660", ONCOR, "Pflugerville", "Travis"),
    ("78664", ONCOR, "Round Rock", "Williamson"),
    ("78665", ONCOR, "Round Rock", "Williamson"),
    ("78681", ONCOR, "Round Rock", "Williamson"),
    ("78666", SAN_MARCOS, "San Marcos", "Hays"),
    ("78701", AUSTIN_ENERGY, "Austin", "Travis"),
    ("78702", AUSTIN_ENERGY, "Austin", "Travis"),
    ("78703", AUSTIN_ENERGY, "Austin", "Travis"),
    ("78704", AUSTIN_ENERGY, "Austin", "Travis"),
    ("78705", AUSTIN_ENERGY, "Austin", "Travis"),
    ("78745", AUSTIN_ENERGY, "Austin", "Travis"),
    ("78758", AUSTIN_ENERGY, "Austin", "Travis"),
    ("78801", AEPC, "Uvalde", "Uvalde"),
    // Panhandle, West Texas
    ("79101", XCEL, "Amarillo", "Potter"),
    ("79106", XCEL, "Amarillo", "Potter"),
    ("79109", XCEL, "Amarillo", "Randall"),
    ("79201", AEPN, "Childress", "Childress"),
    ("79401", LPL, "Lubbock", "Lubbock"),
    ("79403", LPL, "Lubbock", "Lubbock"),
    ("79404", LPL, "Lubbock", "Lubbock"),
    ("79407", LPL, "Lubbock", "Lubbock"),
    ("79410", LPL, "Lubbock", "Lubbock"),
    ("79411", LPL, "Lubbock", "Lubbock"),
    ("79412", LPL, "Lubbock", "Lubbock"),
    ("79413", LPL, "Lubbock", "Lubbock"),
    ("79414", LPL, "Lubbock", "Lubbock"),
    ("79415", LPL, "Lubbock", "Lubbock"),
    ("79416", LPL, "Lubbock", "Lubbock"),
    ("79423", LPL, "Lubbock", "Lubbock"),
    ("79424", LPL, "Lubbock", "Lubbock"),
    ("79556", AEPN, "Sweetwater", "Nolan"),
    ("79601", AEPN, "Abilene", "Taylor"),
    ("79602", AEPN, "Abilene", "Taylor"),
    ("79603", AEPN, "Abilene", "Taylor"),
    ("79605", AEPN, "Abilene", "Taylor"),
    ("79606", AEPN, "Abilene", "Taylor"),
    ("79701", ONCOR, "Midland", "Midland"),
    ("79703", ONCOR, "Midland", "Midland"),
    ("79705", ONCOR, "Midland", "Midland"),
    ("79707", ONCOR, "Midland", "Midland"),
    ("79735", AEPN, "Fort Stockton", "Pecos"),
    ("79761", ONCOR, "Odessa", "Ector"),
    ("79762", ONCOR, "Odessa", "Ector"),
    ("79763", ONCOR, "Odessa", "Ector"),
    ("79772", TNMP, "Pecos", "Reeves"),
    ("79830", AEPN, "Alpine", "Brewster"),
    ("79901", EPE, "El Paso", "El Paso"),
    ("79912", EPE, "El Paso", "El Paso"),
    ("79925", EPE, "El Paso", "El Paso"),
    ("79936", EPE, "El Paso", "El Paso"),
];

/// ZIPs whose boundary crosses two wires utilities. The primary in
/// STATIC_ZIPS is listed first here too.
pub static SPLIT_ZIPS: &[(&str, &[TdspCode])] = &[
    ("75057", &[TdspCode::Tnmp, TdspCode::Oncor]),
    ("75067", &[TdspCode::Tnmp, TdspCode::Oncor]),
    ("77511", &[TdspCode::Tnmp, TdspCode::Centerpoint]),
    ("77546", &[TdspCode::Centerpoint, TdspCode::Tnmp]),
    ("77573", &[TdspCode::Tnmp, TdspCode::Centerpoint]),
];

/// (first, last, area, confidence)
pub static RANGE_RULES: &[(u32, u32, Area, u8)] = &[
    (75000, 75099, ONCOR, 80),
    (75040, 75044, GARLAND, 85),
    (75100, 75199, ONCOR, 75),
    (75200, 75399, ONCOR, 90),
    (75400, 75499, ONCOR, 70),
    (75500, 75599, SWEPCO, 60),
    (75600, 75799, ONCOR, 65),
    (76000, 76299, ONCOR, 85),
    (76200, 76210, DENTON_ME, 80),
    (76300, 76399, ONCOR, 75),
    (76500, 76599, ONCOR, 75),
    (76700, 76799, ONCOR, 80),
    (76900, 76999, AEPN, 80),
    (77000, 77099, CNP, 95),
    (77200, 77299, CNP, 90),
    (77300, 77399, CNP, 70),
    (77301, 77306, ENTERGY, 80),
    (77400, 77499, CNP, 80),
    (77500, 77599, CNP, 70),
    (77563, 77592, TNMP, 70),
    (77700, 77799, ENTERGY, 85),
    (77800, 77899, BTU, 60),
    (77900, 77999, AEPC, 80),
    (78000, 78099, AEPC, 75),
    (78040, 78046, AEPC, 90),
    (78100, 78199, GVEC, 55),
    (78200, 78299, CPS, 95),
    (78300, 78399, AEPC, 75),
    (78400, 78499, AEPC, 95),
    (78500, 78599, AEPC, 85),
    (78520, 78526, BPUB, 85),
    (78600, 78699, PEC, 50),
    (78700, 78799, AUSTIN_ENERGY, 90),
    (78800, 78899, AEPC, 65),
    (79000, 79199, XCEL, 85),
    (79300, 79399, SPEC, 50),
    (79400, 79499, LPL, 85),
    (79500, 79599, AEPN, 75),
    (79600, 79699, AEPN, 90),
    (79700, 79799, ONCOR, 75),
    (79770, 79772, TNMP, 70),
    (79800, 79899, AEPN, 55),
    (79900, 79999, EPE, 95),
    (88500, 88599, EPE, 90),
];

pub static COUNTY_DEFAULTS: &[(&str, Area)] = &[
    ("Anderson", ONCOR),
    ("Bell", ONCOR),
    ("Bexar", CPS),
    ("Brazoria", CNP),
    ("Brazos", BTU),
    ("Brown", ONCOR),
    ("Cameron", AEPC),
    ("Collin", ONCOR),
    ("Dallas", ONCOR),
    ("Denton", ONCOR),
    ("Ector", ONCOR),
    ("El Paso", EPE),
    ("Erath", ONCOR),
    ("Fort Bend", CNP),
    ("Galveston", CNP),
    ("Grayson", ONCOR),
    ("Harris", CNP),
    ("Hidalgo", AEPC),
    ("Jefferson", ENTERGY),
    ("Lubbock", LPL),
    ("McLennan", ONCOR),
    ("Midland", ONCOR),
    ("Montgomery", CNP),
    ("Nueces", AEPC),
    ("Potter", XCEL),
    ("Randall", XCEL),
    ("Smith", ONCOR),
    ("Tarrant", ONCOR),
    ("Taylor", AEPN),
    ("Tom Green", AEPN),
    ("Travis", AUSTIN_ENERGY),
    ("Victoria", AEPC),
    ("Webb", AEPC),
    ("Wichita", ONCOR),
    ("Williamson", ONCOR),
];
