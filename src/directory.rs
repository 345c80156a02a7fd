//! Static Tadawul instrument directory: symbol, display name, sector.
//!
//! The aggregate index lives outside the table; it is fetched for the
//! market overview but never included in the snapshot fan-out.

pub const INDEX_SYMBOL: &str = "^TASI.SR";
pub const INDEX_NAME: &str = "المؤشر العام";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Company {
    pub symbol: &'static str,
    pub name: &'static str,
    pub sector: &'static str,
}

const fn company(symbol: &'static str, name: &'static str, sector: &'static str) -> Company {
    Company { symbol, name, sector }
}

pub const COMPANIES: &[Company] = &[
    company("1010", "بنك الرياض", "البنوك"),
    company("1020", "بنك الجزيرة", "البنوك"),
    company("1030", "البنك السعودي للاستثمار", "البنوك"),
    company("1050", "البنك السعودي الفرنسي", "البنوك"),
    company("1060", "البنك السعودي الأول", "البنوك"),
    company("1080", "البنك العربي الوطني", "البنوك"),
    company("1120", "مصرف الراجحي", "البنوك"),
    company("1140", "بنك البلاد", "البنوك"),
    company("1150", "مصرف الإنماء", "البنوك"),
    company("1180", "البنك الأهلي السعودي", "البنوك"),
    company("1211", "معادن", "المواد الأساسية"),
    company("1301", "أسلاك", "الصناعة"),
    company("1304", "اليمامة للحديد", "الصناعة"),
    company("1320", "أنابيب السعودية", "الصناعة"),
    company("2001", "كيمانول", "المواد الأساسية"),
    company("2002", "بتروكيم", "المواد الأساسية"),
    company("2010", "سابك", "المواد الأساسية"),
    company("2020", "سافكو", "المواد الأساسية"),
    company("2050", "صافولا", "الغذائية"),
    company("2060", "التصنيع", "المواد الأساسية"),
    company("2080", "غازكو", "المرافق العامة"),
    company("2100", "وفرة", "الغذائية"),
    company("2110", "الكابلات", "الصناعة"),
    company("2120", "المتطورة", "الصناعة"),
    company("2130", "صدق", "الصناعة"),
    company("2140", "أييان", "الصناعة"),
    company("2150", "زجاج", "الصناعة"),
    company("2160", "أميانتيت", "الصناعة"),
    company("2170", "اللجين", "المواد الأساسية"),
    company("2180", "فيبكو", "الصناعة"),
    company("2190", "سيسكو", "الصناعة"),
    company("2200", "أنابيب", "الصناعة"),
    company("2210", "نماء للكيماويات", "المواد الأساسية"),
    company("2222", "أرامكو السعودية", "الطاقة"),
    company("2240", "الزامل للصناعة", "الصناعة"),
    company("2250", "المجموعة السعودية", "المواد الأساسية"),
    company("2270", "سدافكو", "الغذائية"),
    company("2280", "المراعي", "الغذائية"),
    company("2290", "ينساب", "المواد الأساسية"),
    company("2300", "المعجل", "الصناعة"),
    company("2310", "سبكيم العالمية", "المواد الأساسية"),
    company("2320", "البابطين", "الصناعة"),
    company("2330", "المتقدمة", "الصناعة"),
    company("2340", "العبداللطيف", "الصناعة"),
    company("2350", "كيان السعودية", "المواد الأساسية"),
    company("2360", "الفخارية", "الصناعة"),
    company("2370", "مسك", "الصناعة"),
    company("2380", "بترو رابغ", "الطاقة"),
    company("2381", "الحبيب", "الرعاية الصحية"),
    company("3001", "أسمنت حائل", "الأسمنت"),
    company("3002", "أسمنت نجران", "الأسمنت"),
    company("3003", "أسمنت المدينة", "الأسمنت"),
    company("3004", "أسمنت الشمالية", "الأسمنت"),
    company("3005", "أسمنت أم القرى", "الأسمنت"),
    company("3010", "أسمنت العربية", "الأسمنت"),
    company("3020", "أسمنت اليمامة", "الأسمنت"),
    company("3030", "أسمنت السعودية", "الأسمنت"),
    company("3040", "أسمنت القصيم", "الأسمنت"),
    company("3050", "أسمنت الجنوبية", "الأسمنت"),
    company("3060", "أسمنت ينبع", "الأسمنت"),
    company("3080", "أسمنت الشرقية", "الأسمنت"),
    company("3090", "أسمنت تبوك", "الأسمنت"),
    company("4001", "أسواق العثيم", "التجزئة"),
    company("4002", "المواساة", "الرعاية الصحية"),
    company("4003", "فتيحي", "التجزئة"),
    company("4004", "دلة الصحية", "الرعاية الصحية"),
    company("4005", "رعاية", "الرعاية الصحية"),
    company("4006", "المزرعة", "التجزئة"),
    company("4007", "الحمادي", "الرعاية الصحية"),
    company("4008", "ساكو", "التجزئة"),
    company("4009", "إكسترا", "التجزئة"),
    company("4010", "دار الأركان", "العقارات"),
    company("4020", "العقارية", "العقارات"),
    company("4030", "البحري", "النقل"),
    company("4090", "طيبة للإستثمار", "العقارات"),
    company("4100", "مكة للإنشاء", "العقارات"),
    company("4110", "باتك", "النقل"),
    company("4150", "التعمير", "العقارات"),
    company("4160", "ثمار", "التجزئة"),
    company("4190", "جرير", "التجزئة"),
    company("4220", "إعمار", "العقارات"),
    company("4230", "البحر الأحمر", "العقارات"),
    company("4240", "الحكير", "التجزئة"),
    company("4250", "جبل عمر", "العقارات"),
    company("4260", "بدجت السعودية", "النقل"),
    company("4290", "الخليج للتدريب", "التجزئة"),
    company("4300", "دار المعدات", "الخدمات"),
    company("4310", "مدينة المعرفة", "العقارات"),
    company("4321", "الأندلس", "العقارات"),
    company("5110", "السعودية للكهرباء", "المرافق العامة"),
    company("6001", "حلواني إخوان", "الغذائية"),
    company("6002", "هرفي للأغذية", "الغذائية"),
    company("6004", "التموين", "الخدمات"),
    company("7010", "اس تي سي", "الاتصالات"),
    company("7020", "اتحاد اتصالات", "الاتصالات"),
    company("7030", "زين السعودية", "الاتصالات"),
    company("7040", "عذيب للاتصالات", "الاتصالات"),
    company("7201", "بحر العرب", "تقنية المعلومات"),
    company("7202", "عِلم", "تقنية المعلومات"),
    company("7203", "توبي", "تقنية المعلومات"),
    company("8010", "التعاونية", "التأمين"),
    company("8012", "جزيرة تكافل", "التأمين"),
    company("8020", "ملاذ للتأمين", "التأمين"),
    company("8030", "ميدغلف للتأمين", "التأمين"),
    company("8040", "أليانز إس إف", "التأمين"),
    company("8050", "سلامة", "التأمين"),
    company("8060", "ولاء للتأمين", "التأمين"),
    company("8070", "الدرع العربي", "التأمين"),
    company("8100", "سايكو", "التأمين"),
    company("8120", "اتحاد الخليج الأهلية", "التأمين"),
    company("8150", "أسيج", "التأمين"),
    company("8160", "التأمين العربية", "التأمين"),
    company("8170", "الاتحاد للتأمين", "التأمين"),
    company("8180", "الصقر للتأمين", "التأمين"),
    company("8190", "المتحدة للتأمين", "التأمين"),
    company("8200", "إعادة", "التأمين"),
    company("8210", "بوبا العربية", "التأمين"),
    company("8230", "الراجحي للتأمين", "التأمين"),
    company("8240", "تشب", "التأمين"),
    company("8250", "إكسا التعاونية", "التأمين"),
    company("8260", "الخليجية العامة", "التأمين"),
    company("8270", "بروج للتأمين", "التأمين"),
    company("8280", "العالمية", "التأمين"),
    company("8300", "سوليدرتي", "التأمين"),
    company("8310", "أمانة للتأمين", "التأمين"),
    company("8311", "عناية", "التأمين"),
];

pub fn lookup(symbol: &str) -> Option<&'static Company> {
    COMPANIES.iter().find(|c| c.symbol == symbol)
}

/// Display name and sector for a symbol, with the original's fallbacks for
/// instruments missing from the table.
pub fn name_and_sector(symbol: &str) -> (String, String) {
    if symbol == INDEX_SYMBOL {
        return (INDEX_NAME.to_string(), "مؤشر".to_string());
    }

    match lookup(symbol) {
        Some(c) => (c.name.to_string(), c.sector.to_string()),
        None => (format!("شركة {}", symbol), "غير معروف".to_string()),
    }
}

/// Symbols included in the snapshot fan-out (the index is excluded).
pub fn tradable_symbols() -> impl Iterator<Item = &'static str> {
    COMPANIES.iter().map(|c| c.symbol)
}

pub fn company_count() -> usize {
    COMPANIES.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_symbol() {
        let company = lookup("1120").expect("1120 is listed");
        assert_eq!(company.name, "مصرف الراجحي");
        assert_eq!(company.sector, "البنوك");
    }

    #[test]
    fn test_fallback_for_unknown_symbol() {
        let (name, sector) = name_and_sector("9999");
        assert_eq!(name, "شركة 9999");
        assert_eq!(sector, "غير معروف");
    }

    #[test]
    fn test_index_excluded_from_tradable() {
        assert!(tradable_symbols().all(|s| s != INDEX_SYMBOL));
        assert_eq!(tradable_symbols().count(), company_count());
    }

    #[test]
    fn test_symbols_are_unique() {
        let mut symbols: Vec<_> = tradable_symbols().collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), company_count());
    }
}
