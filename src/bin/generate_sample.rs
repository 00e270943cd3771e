use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// Quantity breaks per region; each step down the list is a cheaper unit price.
const EU_TIERS: [&str; 4] = ["50", "100", "250", "500"];
const UK_TIERS: [&str; 3] = ["50", "100", "250"];
const US_TIERS: [&str; 3] = ["Tier1", "Tier2", "Tier3"];

/// Region, tiers, exchange factor against the EU base price.
const REGIONS: [(&str, &[&str], f64); 3] = [
    ("EU", &EU_TIERS, 1.0),
    ("UK", &UK_TIERS, 0.86),
    ("US", &US_TIERS, 1.09),
];

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn main() -> Result<(), XlsxError> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_catalog.xlsx".to_string());
    let mut rng = SimpleRng::new(42);

    let categories: [(&str, &str, &[&str], (f64, f64)); 4] = [
        ("Pens", "KP", &["Ballpoint", "Gel Pen", "Rollerball", "Highlighter"], (0.4, 2.5)),
        ("Mugs", "KM", &["Ceramic Mug", "Enamel Mug", "Travel Tumbler", "Glass Cup"], (2.0, 9.0)),
        ("Bags", "KB", &["Cotton Tote", "Drawstring Bag", "Backpack", "Cooler Bag"], (1.0, 14.0)),
        ("Notebooks", "KN", &["A5 Notebook", "A6 Pocketbook", "Spiral Pad", "Sticky Notes"], (0.8, 6.0)),
    ];
    let colors = ["blue", "black", "red", "green", "white", "natural"];
    let tags = ["office", "eco", "premium", "outdoor", "kitchen", "travel", "budget"];

    // Header: base columns, tags, then label_region price columns.
    let mut headers: Vec<String> = ["REF", "Category", "Product Name", "Description", "Tags"]
        .map(String::from)
        .to_vec();
    for (region, tiers, _) in REGIONS {
        for tier in tiers {
            headers.push(format!("{tier}_{region}"));
        }
    }

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("All Products")?;

    for (c, h) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, h, &bold)?;
    }

    let mut row: u32 = 1;
    for (category, prefix, names, (lo, hi)) in categories {
        for (i, name) in names.iter().enumerate() {
            let color = rng.pick(&colors);
            let base_price = rng.range(lo, hi);

            sheet.write_string(row, 0, format!("{prefix}-{:04}", 1000 + i * 7))?;
            sheet.write_string(row, 1, category)?;
            sheet.write_string(row, 2, *name)?;
            sheet.write_string(row, 3, format!("{name} in {color}"))?;
            sheet.write_string(row, 4, format!("{} {}", rng.pick(&tags), rng.pick(&tags)))?;

            let mut col: u16 = 5;
            for (_, tiers, factor) in REGIONS {
                for step in 0..tiers.len() {
                    // Roughly 8% off per tier step.
                    let price = base_price * factor * 0.92f64.powi(step as i32);
                    sheet.write_number(row, col, round2(price))?;
                    col += 1;
                }
            }
            row += 1;
        }
    }

    workbook.save(&output_path)?;
    println!("Wrote {} products to {output_path}", row - 1);
    Ok(())
}
